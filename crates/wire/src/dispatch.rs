//! Path-based dispatch
//!
//! Maps protocol paths to registry handlers, decoding the JSON body and
//! encoding the JSON response. A transport embeds this as its request
//! handler; nothing here knows about HTTP.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{
    CommitRequest, DeleteRequest, DiscardRequest, FetchRequest, FetchResponse, GetRequest,
    GetResponse, NewSnapshotRequest, NewTransactionRequest, RangeRequest, RollbackRequest,
    ScanRequest, SetRequest, StatusResponse,
};
use crate::session::SessionRegistry;

/// Responses that can carry a transport-level failure
trait ErrorResponse: Sized {
    fn from_error(message: String) -> Self;
}

impl ErrorResponse for StatusResponse {
    fn from_error(message: String) -> Self {
        StatusResponse::err(message)
    }
}

impl ErrorResponse for GetResponse {
    fn from_error(message: String) -> Self {
        GetResponse {
            error: message,
            ..GetResponse::default()
        }
    }
}

impl ErrorResponse for FetchResponse {
    fn from_error(message: String) -> Self {
        FetchResponse {
            error: message,
            ..FetchResponse::default()
        }
    }
}

fn route<Req, Resp>(body: &str, handler: impl FnOnce(Req) -> Resp) -> String
where
    Req: DeserializeOwned,
    Resp: Serialize + ErrorResponse,
{
    let response = match serde_json::from_str::<Req>(body) {
        Ok(request) => handler(request),
        Err(e) => Resp::from_error(format!("bad request payload: {e}")),
    };
    serde_json::to_string(&response)
        .unwrap_or_else(|e| format!(r#"{{"error":"response encoding failed: {e}"}}"#))
}

impl SessionRegistry {
    /// Decode `body`, run the handler for `path`, encode the response
    ///
    /// Unknown paths answer with a `StatusResponse` naming the path.
    pub fn dispatch(&self, path: &str, body: &str) -> String {
        match path {
            "/new-transaction" => route(body, |req: NewTransactionRequest| {
                self.new_transaction(req)
            }),
            "/new-snapshot" => route(body, |req: NewSnapshotRequest| self.new_snapshot(req)),
            "/tx/get" | "/snap/get" => route(body, |req: GetRequest| self.get(req)),
            "/tx/set" => route(body, |req: SetRequest| self.set(req)),
            "/tx/delete" => route(body, |req: DeleteRequest| self.delete(req)),
            "/tx/ascend" | "/snap/ascend" => route(body, |req: RangeRequest| self.ascend(req)),
            "/tx/descend" | "/snap/descend" => route(body, |req: RangeRequest| self.descend(req)),
            "/tx/scan" | "/snap/scan" => route(body, |req: ScanRequest| self.scan(req)),
            "/tx/commit" => route(body, |req: CommitRequest| self.commit(req)),
            "/tx/rollback" => route(body, |req: RollbackRequest| self.rollback(req)),
            "/snap/discard" => route(body, |req: DiscardRequest| self.discard(req)),
            "/it/fetch" => route(body, |req: FetchRequest| self.fetch(req)),
            _ => serde_json::to_string(&StatusResponse::err(format!("unknown path: {path}")))
                .expect("static response serializes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memkv_engine::Database;

    #[test]
    fn test_unknown_path() {
        let reg = SessionRegistry::new(Database::new());
        let raw = reg.dispatch("/no/such/path", "{}");
        let resp: StatusResponse = serde_json::from_str(&raw).unwrap();
        assert!(resp.error.contains("unknown path"));
    }

    #[test]
    fn test_bad_payload() {
        let reg = SessionRegistry::new(Database::new());
        let raw = reg.dispatch("/new-transaction", "not json");
        let resp: StatusResponse = serde_json::from_str(&raw).unwrap();
        assert!(resp.error.contains("bad request payload"));
    }

    #[test]
    fn test_dispatch_round_trip() {
        let reg = SessionRegistry::new(Database::new());

        let raw = reg.dispatch("/new-transaction", r#"{"name":"t1"}"#);
        let resp: StatusResponse = serde_json::from_str(&raw).unwrap();
        assert!(resp.is_ok(), "{}", resp.error);

        let raw = reg.dispatch("/tx/set", r#"{"transaction":"t1","key":"k","value":[104,105]}"#);
        let resp: StatusResponse = serde_json::from_str(&raw).unwrap();
        assert!(resp.is_ok(), "{}", resp.error);

        let raw = reg.dispatch("/tx/get", r#"{"transaction":"t1","key":"k"}"#);
        let resp: GetResponse = serde_json::from_str(&raw).unwrap();
        assert!(resp.error.is_empty());
        assert_eq!(resp.value, b"hi".to_vec());

        let raw = reg.dispatch("/tx/commit", r#"{"transaction":"t1"}"#);
        let resp: StatusResponse = serde_json::from_str(&raw).unwrap();
        assert!(resp.is_ok(), "{}", resp.error);
    }
}
