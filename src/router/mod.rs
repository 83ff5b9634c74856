//! Path routing: resolve a path to a destination, or reverse a route name
//! back into a path.

pub mod path;
pub mod service;

use std::fmt;
use std::sync::Arc;

use path::{compile, compile_pattern, CompiledPath, Piece};

pub use path::Slot;
pub use service::RouterService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    DuplicateRoute(String),
    MalformedPath { path: String, reason: String },
    ArityMismatch { route: String, arity: usize, available: usize },
    UnknownRoute(String),
    MissingParams { route: String, expected: usize, given: usize },
    Irreversible(String),
    InvalidParam { route: String, index: usize, reason: String },
    NoMatch(String),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::DuplicateRoute(name) => write!(f, "duplicate route: {}", name),
            RouterError::MalformedPath { path, reason } => {
                write!(f, "malformed path {:?}: {}", path, reason)
            }
            RouterError::ArityMismatch {
                route,
                arity,
                available,
            } => write!(
                f,
                "route {} handler takes {} params but the path supplies {}",
                route, arity, available
            ),
            RouterError::UnknownRoute(name) => write!(f, "unknown route: {}", name),
            RouterError::MissingParams {
                route,
                expected,
                given,
            } => write!(
                f,
                "route {} needs {} params, got {}",
                route, expected, given
            ),
            RouterError::Irreversible(name) => {
                write!(f, "route {} was defined by a raw pattern and cannot be reversed", name)
            }
            RouterError::InvalidParam {
                route,
                index,
                reason,
            } => write!(f, "route {} param {}: {}", route, index, reason),
            RouterError::NoMatch(path) => write!(f, "no route matches {:?}", path),
        }
    }
}

impl std::error::Error for RouterError {}

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(i64),
    Str(String),
}

impl Param {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Param::Int(n) => Some(*n),
            Param::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            Param::Int(_) => None,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Int(n) => write!(f, "{}", n),
            Param::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::Int(n)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Str(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub name: String,
    pub params: Vec<Param>,
    pub target: T,
}

type MethodFn<T> = Arc<dyn Fn(&[Param]) -> T + Send + Sync>;

enum Destination<T> {
    Value(T),
    /// Receives the first `arity` params.
    Method { arity: usize, f: MethodFn<T> },
}

struct Route<T> {
    name: String,
    path: CompiledPath,
    destination: Destination<T>,
}

/// Ordered route table. The first route that matches wins.
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, path: &str, target: T) -> Result<&mut Self> {
        let compiled = compile(path)?;
        self.push(name.into(), compiled, Destination::Value(target))
    }

    /// Adds a route matched by a raw regular expression. Such routes resolve
    /// but cannot be reversed.
    pub fn add_pattern(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        target: T,
    ) -> Result<&mut Self> {
        let compiled = compile_pattern(pattern)?;
        self.push(name.into(), compiled, Destination::Value(target))
    }

    /// Adds a route whose target is computed from the first `arity` params.
    pub fn add_method(
        &mut self,
        name: impl Into<String>,
        path: &str,
        arity: usize,
        f: impl Fn(&[Param]) -> T + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        let name = name.into();
        let compiled = compile(path)?;
        if arity > compiled.slots.len() {
            return Err(RouterError::ArityMismatch {
                route: name,
                arity,
                available: compiled.slots.len(),
            });
        }
        self.push(
            name,
            compiled,
            Destination::Method {
                arity,
                f: Arc::new(f),
            },
        )
    }

    fn push(
        &mut self,
        name: String,
        path: CompiledPath,
        destination: Destination<T>,
    ) -> Result<&mut Self> {
        if self.contains(&name) {
            return Err(RouterError::DuplicateRoute(name));
        }
        tracing::trace!(route = %name, pattern = path.regex.as_str(), "route added");
        self.routes.push(Route {
            name,
            path,
            destination,
        });
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.iter().any(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn reverse(&self, name: &str, params: &[Param]) -> Result<String> {
        let route = self
            .routes
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;
        let template = route
            .path
            .template
            .as_ref()
            .ok_or_else(|| RouterError::Irreversible(name.to_string()))?;
        let expected = route.path.slots.len();
        if params.len() < expected {
            return Err(RouterError::MissingParams {
                route: name.to_string(),
                expected,
                given: params.len(),
            });
        }

        let invalid = |index: usize, reason: &str| RouterError::InvalidParam {
            route: name.to_string(),
            index,
            reason: reason.to_string(),
        };
        let mut out = String::new();
        let mut params = params.iter().enumerate();
        for piece in template {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Slot(slot) => {
                    let Some((index, param)) = params.next() else {
                        return Err(invalid(expected, "missing"));
                    };
                    match (slot, param) {
                        (Slot::Int, Param::Str(s)) if s.parse::<i64>().is_err() => {
                            return Err(invalid(index, "expected an integer"));
                        }
                        (_, Param::Str(s)) if s.is_empty() || s.contains('/') => {
                            return Err(invalid(index, "must be a non-empty path segment"));
                        }
                        _ => {}
                    }
                    out.push_str(&param.to_string());
                }
            }
        }
        Ok(out)
    }
}

impl<T: Clone> Router<T> {
    /// Finds the first route matching `path`. An `{int}` slot whose text is
    /// not an integer makes that route not match.
    pub fn resolve(&self, path: &str) -> Option<Resolution<T>> {
        'routes: for route in &self.routes {
            let Some(caps) = route.path.regex.captures(path) else {
                continue;
            };
            let mut params = Vec::with_capacity(route.path.slots.len());
            for (i, slot) in route.path.slots.iter().enumerate() {
                let text = caps.get(i + 1).map_or("", |m| m.as_str());
                match slot {
                    Slot::Int => match text.parse::<i64>() {
                        Ok(n) => params.push(Param::Int(n)),
                        Err(_) => continue 'routes,
                    },
                    Slot::Str => params.push(Param::Str(text.to_string())),
                }
            }

            let target = match &route.destination {
                Destination::Value(target) => target.clone(),
                Destination::Method { arity, f } => f(&params[..*arity]),
            };
            return Some(Resolution {
                name: route.name.clone(),
                params,
                target,
            });
        }
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/router/router.rs"]
mod tests;
