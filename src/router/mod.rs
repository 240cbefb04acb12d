//! Maps `(method, path)` to a handler, with middleware, mutators, and error handlers.
//!
//! - [`path`] path normalization, applied as the built-in mutator.
//! - [`tree`] the dynamic (parametric) segment tree used when any route has a `{name}` capture.
//!
//! Two lookup modes are selected automatically at [`build`](RouterBuilder::build) time: a flat
//! hash map of literal paths when every registered template is literal, or a [`tree::Node`] when
//! any template contains a `{name}` capture. Mixing the two costs nothing extra at call sites —
//! [`Router::dispatch`] hides the mode behind one path.

pub mod path;
pub mod tree;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{Error, ErrorKind};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A route handler: an owned, cloneable closure from request to response.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps a `Handler` with another, applied once at build time (not per-request).
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Runs once per request before route lookup; may rewrite the request's path or environment.
pub type Mutator = Arc<dyn Fn(&mut Request) + Send + Sync>;

pub type ErrorHandler = Arc<dyn Fn(Request, Error) -> BoxFuture<'static, Response> + Send + Sync>;

/// Stashed in the request [`Env`] when a route matches by path but not by method.
#[derive(Debug, Clone)]
pub struct AllowedMethods(pub String);

/// Generates `get`/`post`/... shorthands for a type exposing `route`, matching the method list
/// and declaration order in [`Method::ALL`].
macro_rules! shorthand_routes {
    () => {
        pub fn get<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::GET, template.into(), handler)
        }

        pub fn head<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::HEAD, template.into(), handler)
        }

        pub fn post<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::POST, template.into(), handler)
        }

        pub fn put<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::PUT, template.into(), handler)
        }

        pub fn delete<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::DELETE, template.into(), handler)
        }

        pub fn connect<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::CONNECT, template.into(), handler)
        }

        pub fn options<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::OPTIONS, template.into(), handler)
        }

        pub fn trace<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::TRACE, template.into(), handler)
        }

        pub fn patch<F, Fut>(&mut self, template: impl Into<String>, handler: F) -> &mut Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Response> + Send + 'static,
        {
            self.route(Method::PATCH, template.into(), handler)
        }
    };
}

fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

fn error_handler_fn<F, Fut>(f: F) -> ErrorHandler
where
    F: Fn(Request, Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req, err| Box::pin(f(req, err)))
}

struct Endpoint {
    handlers: HashMap<Method, Handler>,
    allow: String,
}

impl Endpoint {
    fn new() -> Self {
        Self { handlers: HashMap::new(), allow: String::new() }
    }

    fn insert(&mut self, method: Method, handler: Handler) {
        self.handlers.insert(method, handler);
        self.recompute_allow();
    }

    fn recompute_allow(&mut self) {
        self.allow = Method::ALL
            .iter()
            .filter(|m| self.handlers.contains_key(m))
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
    }

    /// `HEAD` falls back to the registered `GET` handler when no `HEAD` handler exists.
    fn resolve(&self, method: Method) -> Option<&Handler> {
        self.handlers.get(&method).or_else(|| (method == Method::HEAD).then(|| self.handlers.get(&Method::GET)).flatten())
    }
}

enum Mode {
    Static(HashMap<String, Endpoint>),
    Dynamic(tree::Node<Endpoint>),
}

/// A compiled, read-only routing table. Cheap to clone (wraps an `Arc`) and safe to share across
/// every connection task without locking.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    mode: Mode,
    mutators: Vec<Mutator>,
    error_handlers: HashMap<ErrorKind, ErrorHandler>,
    options_star: Option<String>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

struct Registration {
    template: String,
    method: Method,
    handler: Handler,
}

/// Builds a [`Router`]. Routes, mutators, and error handlers are all registered against this
/// type (directly or through a [`Group`]); call [`build`](RouterBuilder::build) once done.
pub struct RouterBuilder {
    registrations: Vec<Registration>,
    root_middlewares: Vec<Middleware>,
    mutators: Vec<Mutator>,
    error_handlers: HashMap<ErrorKind, ErrorHandler>,
    enable_options_star: bool,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            root_middlewares: Vec::new(),
            mutators: vec![Arc::new(|req: &mut Request| req.set_path(path::normalize(req.path())))],
            error_handlers: HashMap::new(),
            enable_options_star: false,
        }
    }

    /// Registers a handler with no point-applied middleware.
    pub fn route<F, Fut>(&mut self, method: Method, template: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route_with(method, template, handler, Vec::new())
    }

    /// Registers a handler wrapped by `middlewares`, innermost first.
    pub fn route_with<F, Fut>(
        &mut self,
        method: Method,
        template: impl Into<String>,
        handler: F,
        middlewares: Vec<Middleware>,
    ) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let mut h = handler_fn(handler);
        for mw in middlewares {
            h = mw(h);
        }
        self.registrations.push(Registration { template: template.into(), method, handler: h });
        self
    }

    shorthand_routes!();

    /// Opens a [`Resource`] bound to `path`: method shorthands registered through it all share
    /// that one path, which only needs to be written once.
    pub fn resource(&mut self, path: impl Into<String>) -> Resource<'_, Self> {
        Resource { target: self, path: path.into() }
    }

    /// Serves files out of `root` for any request under `prefix`, joining the remainder of the
    /// request path onto `root`. Segments normalize through the router's usual path mutator
    /// first, so `..` cannot escape `root`.
    pub fn static_dir(&mut self, prefix: impl Into<String>, root: impl Into<std::path::PathBuf>) -> &mut Self {
        let prefix = prefix.into();
        let template = format!("{}/*rest", prefix.trim_end_matches('/'));
        let root = root.into();
        self.route(Method::GET, template, move |req| {
            let root = root.clone();
            async move { serve_static(&root, req.params().get("rest").unwrap_or("")) }
        })
    }

    /// Adds a root-level middleware, applied outermost to every route in the router.
    pub fn middleware(&mut self, mw: Middleware) -> &mut Self {
        self.root_middlewares.push(mw);
        self
    }

    /// Adds a mutator, run once per request before route lookup.
    pub fn mutator(&mut self, mutator: Mutator) -> &mut Self {
        self.mutators.push(mutator);
        self
    }

    pub fn on_error<F, Fut>(&mut self, kind: ErrorKind, handler: F) -> &mut Self
    where
        F: Fn(Request, Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.error_handlers.insert(kind, error_handler_fn(handler));
        self
    }

    /// Enables the server-wide `OPTIONS *` response enumerating every method registered by any
    /// route anywhere in the router.
    pub fn enable_options_star(&mut self) -> &mut Self {
        self.enable_options_star = true;
        self
    }

    /// Opens a path-prefixed group; `middlewares` wrap every route registered inside it
    /// (including nested sub-groups), innermost relative to routes outside the group.
    pub fn group(&mut self, prefix: impl Into<String>, middlewares: Vec<Middleware>, build: impl FnOnce(&mut Group<'_>)) {
        let mut group = Group { builder: self, prefix: prefix.into(), stack: vec![middlewares] };
        build(&mut group);
    }

    pub fn build(self) -> Router {
        let dynamic = self.registrations.iter().any(|r| r.template.contains('{') || r.template.contains('*'));

        let options_star = self.enable_options_star.then(|| {
            let mut methods: Vec<&str> =
                self.registrations.iter().map(|r| r.method.as_str()).collect::<std::collections::HashSet<_>>().into_iter().collect();
            methods.sort_unstable();
            methods.join(", ")
        });

        // root middlewares wrap last, so they end up outermost relative to every point-applied
        // and group middleware already folded into each registration's handler.
        let root_middlewares = self.root_middlewares;
        let registrations: Vec<Registration> = self
            .registrations
            .into_iter()
            .map(|mut reg| {
                for mw in &root_middlewares {
                    reg.handler = mw(reg.handler);
                }
                reg
            })
            .collect();

        let mode = if dynamic {
            let mut root: tree::Node<Endpoint> = tree::Node::new();
            for reg in registrations {
                let segments: Vec<&str> = reg.template.split('/').filter(|s| !s.is_empty()).collect();
                insert_dynamic(&mut root, &segments, reg.method, reg.handler);
            }
            Mode::Dynamic(root)
        } else {
            let mut map: HashMap<String, Endpoint> = HashMap::new();
            for reg in registrations {
                map.entry(reg.template).or_insert_with(Endpoint::new).insert(reg.method, reg.handler);
            }
            Mode::Static(map)
        };

        Router {
            inner: Arc::new(RouterInner {
                mode,
                mutators: self.mutators,
                error_handlers: self.error_handlers,
                options_star,
            }),
        }
    }
}

/// Implemented by whatever a [`Resource`] registers routes against: a [`RouterBuilder`] or a
/// [`Group`].
trait RouteTarget {
    fn route<F, Fut>(&mut self, method: Method, template: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static;
}

impl RouteTarget for RouterBuilder {
    fn route<F, Fut>(&mut self, method: Method, template: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        RouterBuilder::route(self, method, template, handler)
    }
}

/// Wraps a single path so every HTTP method registered through it shares that path, mirroring
/// how a REST resource (`/users/{id}`) usually groups its verbs together in application code.
pub struct Resource<'r, T> {
    target: &'r mut T,
    path: String,
}

impl<T: RouteTarget> Resource<'_, T> {
    pub fn get<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::GET, handler)
    }

    pub fn head<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::HEAD, handler)
    }

    pub fn post<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::POST, handler)
    }

    pub fn put<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::PUT, handler)
    }

    pub fn delete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::DELETE, handler)
    }

    pub fn patch<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::PATCH, handler)
    }

    fn route<F, Fut>(self, method: Method, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.target.route(method, self.path.clone(), handler);
        self
    }
}

/// Builds the endpoint a [`RouterBuilder::static_dir`] registration resolves to.
fn serve_static(root: &std::path::Path, rest: &str) -> Response {
    Response::new().file(root.join(rest))
}

fn insert_dynamic(root: &mut tree::Node<Endpoint>, segments: &[&str], method: Method, handler: Handler) {
    // the tree only stores one endpoint per exact segment path; find-or-insert by walking and
    // mutating in place via a second lookup is awkward with the current `Node` API, so route
    // registration for dynamic mode builds a fresh endpoint per distinct template and merges
    // method handlers into it before the final insert.
    let mut params = crate::kv::KvList::new();
    if let Some(existing) = root.lookup(segments, &mut params) {
        // SAFETY-free approach: rebuild via direct mutable insert since `Node` doesn't expose a
        // `get_mut`; simplest correct option is to accumulate handlers in a temporary map keyed
        // by template before building the tree. See `RouterBuilder::build`, which takes this path
        // only when a template repeats across methods.
        let mut endpoint = Endpoint::new();
        for (m, h) in existing.handlers.iter() {
            endpoint.insert(*m, h.clone());
        }
        endpoint.insert(method, handler);
        root.insert(segments, endpoint);
    } else {
        let mut endpoint = Endpoint::new();
        endpoint.insert(method, handler);
        root.insert(segments, endpoint);
    }
}

/// A path-prefixed, middleware-wrapped view onto a [`RouterBuilder`], usable recursively for
/// nested groups.
pub struct Group<'r> {
    builder: &'r mut RouterBuilder,
    prefix: String,
    stack: Vec<Vec<Middleware>>,
}

impl Group<'_> {
    pub fn route<F, Fut>(&mut self, method: Method, template: impl AsRef<str>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route_with(method, template, handler, Vec::new())
    }

    pub fn route_with<F, Fut>(
        &mut self,
        method: Method,
        template: impl AsRef<str>,
        handler: F,
        point_middlewares: Vec<Middleware>,
    ) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let mut h = handler_fn(handler);
        for mw in point_middlewares {
            h = mw(h);
        }
        // deepest-enclosing-group-first, per the router's middleware precedence.
        for layer in self.stack.iter().rev() {
            for mw in layer.iter() {
                h = mw(h);
            }
        }
        let full_path = format!("{}{}", self.prefix.trim_end_matches('/'), template.as_ref());
        self.builder.registrations.push(Registration { template: full_path, method, handler: h });
        self
    }

    /// Opens a nested group; `middlewares` are innermost relative to this group's own.
    pub fn group(&mut self, prefix: impl AsRef<str>, middlewares: Vec<Middleware>, build: impl FnOnce(&mut Group<'_>)) {
        let mut stack = self.stack.clone();
        stack.push(middlewares);
        let mut nested =
            Group { builder: self.builder, prefix: format!("{}{}", self.prefix.trim_end_matches('/'), prefix.as_ref()), stack };
        build(&mut nested);
    }

    shorthand_routes!();

    /// Opens a [`Resource`] bound to `path`, relative to this group's prefix.
    pub fn resource(&mut self, path: impl Into<String>) -> Resource<'_, Self> {
        Resource { target: self, path: path.into() }
    }
}

impl RouteTarget for Group<'_> {
    fn route<F, Fut>(&mut self, method: Method, template: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Group::route(self, method, template.into(), handler)
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    fn lookup<'a>(&'a self, path: &str, req: &mut Request) -> Result<&'a Handler, Error> {
        let endpoint = match &self.inner.mode {
            Mode::Static(map) => map.get(path),
            Mode::Dynamic(tree) => {
                let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
                tree.lookup(&segments, req.params_mut())
            }
        };

        let Some(endpoint) = endpoint else {
            return Err(Error::from(ErrorKind::NotFound));
        };

        if let Some(handler) = endpoint.resolve(req.method()) {
            return Ok(handler);
        }

        req.env_mut().insert(AllowedMethods(endpoint.allow.clone()));

        if req.method() == Method::TRACE {
            // handled by the caller via trace_echo; surfaced as MethodNotAllowed here so
            // `dispatch` can distinguish "no handler, auto-echo" from a real 405.
        }
        Err(Error::from(ErrorKind::MethodNotAllowed))
    }

    /// Runs mutators, looks up a handler, and invokes it — or produces the matching error
    /// response via the router's error-handler table (falling back to [`Response::error`]).
    pub async fn dispatch(&self, mut req: Request) -> Response {
        for mutator in &self.inner.mutators {
            mutator(&mut req);
        }

        if req.method() == Method::OPTIONS && req.path() == "*" {
            if let Some(methods) = &self.inner.options_star {
                return Response::new().code(crate::status::StatusCode::NO_CONTENT).header("Allow", methods.clone());
            }
        }

        let path = req.path().to_string();
        match self.lookup(&path, &mut req) {
            Ok(handler) => handler(req).await,
            Err(err) if err.kind == ErrorKind::MethodNotAllowed && req.method() == Method::TRACE => {
                trace_echo(&req)
            }
            Err(err) => self.render_error(req, err).await,
        }
    }

    async fn render_error(&self, req: Request, err: Error) -> Response {
        if let Some(handler) = self.inner.error_handlers.get(&err.kind) {
            return handler(req, err).await;
        }
        let allow = req.env().get::<AllowedMethods>().cloned();
        let mut resp = Response::error(&err, None);
        if let Some(AllowedMethods(allow)) = allow {
            resp = resp.header("Allow", allow);
        }
        resp
    }
}

/// Built-in `TRACE` responder: echoes the request line and headers back with
/// `Content-Type: message/http`, used only when no explicit `TRACE` handler is registered.
fn trace_echo(req: &Request) -> Response {
    let mut body = format!("{} {} {}\r\n", req.method().as_str(), req.path(), req.version().as_str());
    for (k, v) in req.headers().iter() {
        body.push_str(k);
        body.push_str(": ");
        body.push_str(v);
        body.push_str("\r\n");
    }
    Response::new().content_type("message/http").string(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok(_: Request) -> Response {
        Response::new().string("ok")
    }

    async fn echo_id(mut req: Request) -> Response {
        let id = req.params().get("id").unwrap_or("").to_string();
        Response::new().string(id)
    }

    fn dummy_request(method: Method, path: &str) -> Request {
        let line = format!("{} {} HTTP/1.1\r\n\r\n", method.as_str(), path);
        let buf = line.into_bytes();
        let raw = match crate::h1::parse_head(&buf, &crate::config::Limits::default()).unwrap() {
            crate::h1::Status::Complete(h) => h,
            crate::h1::Status::NeedMore => panic!("need more"),
        };
        let mut arena = crate::arena::Arena::new();
        crate::request::Request::from_raw_head(raw, &mut arena, None).unwrap()
    }

    #[tokio::test]
    async fn static_route_matches() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/health", ok);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "/health")).await;
        assert_eq!(resp.code, crate::status::StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/health", ok);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "/missing")).await;
        assert_eq!(resp.code, crate::status::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_method_not_allowed_with_allow_header() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/health", ok);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::POST, "/health")).await;
        assert_eq!(resp.code, crate::status::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers.get("Allow"), Some("GET"));
    }

    #[tokio::test]
    async fn head_falls_back_to_get_handler() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/health", ok);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::HEAD, "/health")).await;
        assert_eq!(resp.code, crate::status::StatusCode::OK);
    }

    #[tokio::test]
    async fn dynamic_route_captures_param() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/users/{id}", echo_id);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "/users/42")).await;
        match resp.body {
            crate::response::Body::Buffered(b) => assert_eq!(b, b"42"),
            _ => panic!("expected buffered body"),
        }
    }

    #[tokio::test]
    async fn trace_without_handler_is_echoed() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/health", ok);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::TRACE, "/health")).await;
        assert_eq!(resp.content_type.as_deref(), Some("message/http"));
    }

    #[tokio::test]
    async fn path_with_duplicate_slashes_is_normalized_before_lookup() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/health", ok);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "//health")).await;
        assert_eq!(resp.code, crate::status::StatusCode::OK);
    }

    #[tokio::test]
    async fn root_middleware_wraps_every_route() {
        let mut builder = RouterBuilder::new();
        builder.route(Method::GET, "/health", ok);
        builder.middleware(Arc::new(|inner: Handler| {
            handler_fn(move |req| {
                let inner = inner.clone();
                async move { inner(req).await.header("X-Root", "yes") }
            })
        }));
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "/health")).await;
        assert_eq!(resp.headers.get("X-Root"), Some("yes"));
    }

    #[tokio::test]
    async fn resource_registers_multiple_methods_on_one_path() {
        let mut builder = RouterBuilder::new();
        builder.resource("/items").get(ok).post(ok);
        let router = builder.build();
        let get_resp = router.dispatch(dummy_request(Method::GET, "/items")).await;
        assert_eq!(get_resp.code, crate::status::StatusCode::OK);
        let post_resp = router.dispatch(dummy_request(Method::POST, "/items")).await;
        assert_eq!(post_resp.code, crate::status::StatusCode::OK);
        let resp = router.dispatch(dummy_request(Method::DELETE, "/items")).await;
        assert_eq!(resp.code, crate::status::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn shorthand_method_registers_like_route() {
        let mut builder = RouterBuilder::new();
        builder.get("/health", ok);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "/health")).await;
        assert_eq!(resp.code, crate::status::StatusCode::OK);
    }

    #[tokio::test]
    async fn static_dir_serves_file_under_root() {
        let dir = std::env::temp_dir().join(format!("corehttp-static-dir-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hello.txt"), b"hello").unwrap();

        let mut builder = RouterBuilder::new();
        builder.static_dir("/assets", &dir);
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "/assets/hello.txt")).await;
        match resp.body {
            crate::response::Body::File(p) => assert_eq!(p, dir.join("hello.txt")),
            _ => panic!("expected file body"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn group_wraps_routes_with_prefix_and_middleware() {
        let mut builder = RouterBuilder::new();
        let tagged: Middleware = Arc::new(|inner: Handler| {
            handler_fn(move |req| {
                let inner = inner.clone();
                async move {
                    let resp = inner(req).await;
                    resp.header("X-Group", "yes")
                }
            })
        });
        builder.group("/api", vec![tagged], |g| {
            g.route(Method::GET, "/health", ok);
        });
        let router = builder.build();
        let resp = router.dispatch(dummy_request(Method::GET, "/api/health")).await;
        assert_eq!(resp.headers.get("X-Group"), Some("yes"));
    }
}
