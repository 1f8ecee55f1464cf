use crate::transport::{HttpBackend, HttpRequest, HttpResponse, TransportError};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Scripted in-memory backend.
///
/// Replies are served in the order they were pushed; once the script runs
/// dry the fallback response (if any) is returned forever. Every request is
/// recorded for later inspection.
#[derive(Debug, Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    fallback: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that answers every request with `response`.
    pub fn always(response: HttpResponse) -> Self {
        let backend = Self::new();
        *lock(&backend.fallback) = Some(response);
        backend
    }

    pub fn push_response(&self, response: HttpResponse) -> &Self {
        lock(&self.script).push_back(Ok(response));
        self
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

impl HttpBackend for MockBackend {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request.clone());
        if let Some(next) = lock(&self.script).pop_front() {
            return next;
        }
        lock(&self.fallback).clone().ok_or_else(|| {
            TransportError::Protocol("mock backend has no scripted response".to_string())
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use std::time::Duration;

    fn request() -> HttpRequest {
        HttpRequest {
            url: "http://localhost/".to_string(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"{}"),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_script_then_fallback() {
        let backend = MockBackend::always(HttpResponse::new(StatusCode::OK, "fallback"));
        backend
            .push_response(HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, ""))
            .push_error(TransportError::Connection("reset".to_string()));

        assert_eq!(
            backend.execute(&request()).unwrap().status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert!(backend.execute(&request()).is_err());
        assert_eq!(backend.execute(&request()).unwrap().body, "fallback");
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_empty_script_errors() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.execute(&request()),
            Err(TransportError::Protocol(_))
        ));
        assert_eq!(backend.requests().len(), 1);
    }
}
