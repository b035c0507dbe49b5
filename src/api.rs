use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use matchit::Router;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::registry::Registry;

pub mod catalog;
pub mod health;

/// Route identifier
#[derive(Clone, Copy)]
enum Route {
    Health,
    Catalog,
    GetExtension,
}

/// Build the router
fn build_router() -> Result<Router<Route>, matchit::InsertError> {
    let mut router = Router::new();
    router.insert("/health", Route::Health)?;
    router.insert("/api/extensions.json", Route::Catalog)?;
    router.insert("/api/extensions/{id}", Route::GetExtension)?;
    Ok(router)
}

/// Build a JSON response with the given status
pub(crate) fn json_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

/// Handle incoming requests
async fn handle_request(
    req: Request<Incoming>,
    registry: Arc<dyn Registry>,
    router: Arc<Router<Route>>,
) -> Result<Response<Full<Bytes>>, std::convert::Infallible> {
    let method = req.method().clone();
    let path = req.uri().path();

    debug!("{} {}", method, path);

    let matched = match router.at(path) {
        Ok(m) => m,
        Err(_) => {
            return Ok(json_response(StatusCode::NOT_FOUND, r#"{"error":"Not found"}"#));
        }
    };

    let route = *matched.value;
    let params = matched.params;

    let result = match (method, route) {
        (Method::GET, Route::Health) => health::health(registry).await,
        (Method::GET, Route::Catalog) => catalog::document(registry).await,
        (Method::GET, Route::GetExtension) => {
            let id = params.get("id").unwrap_or_default();
            catalog::get(registry, id).await
        }
        _ => Ok(json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            r#"{"error":"Method not allowed"}"#,
        )),
    };

    match result {
        Ok(response) => Ok(response),
        Err(e) => Ok(e.into_response()),
    }
}

/// Serve the mirror on an already bound listener
pub async fn serve(listener: TcpListener, registry: Arc<dyn Registry>) -> anyhow::Result<()> {
    let router = Arc::new(build_router()?);

    loop {
        let (stream, remote_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let registry = Arc::clone(&registry);
        let router = Arc::clone(&router);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let registry = Arc::clone(&registry);
                let router = Arc::clone(&router);
                handle_request(req, registry, router)
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection from {}: {}", remote_addr, e);
            }
        });
    }
}

/// Run the catalog mirror
pub async fn run(config: Config, registry: Arc<dyn Registry>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Catalog mirror listening on http://{}/api/extensions.json", addr);

    serve(listener, registry).await
}
