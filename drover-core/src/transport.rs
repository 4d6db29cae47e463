use std::future::Future;

use drover_http::{Error as HttpError, HttpClient, HttpRequest, HttpResponse};

/// The seam between the engine and the wire.
///
/// Virtual users only ever see this trait, so tests can swap the real
/// hyper-backed client for an in-process fake that counts calls or returns
/// canned statuses.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        req: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

impl Transport for HttpClient {
    fn execute(
        &self,
        req: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send {
        self.request(req)
    }
}
