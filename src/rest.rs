//! Server info REST surface
//!
//! Thin glue: builds the response body for the `GET` endpoint exposing
//! the local node's flight endpoint descriptor. Routing, request parsing
//! and transport belong to the host's REST layer.

use crate::discovery::EndpointDirectory;

/// Response body for the local server-info endpoint
pub fn server_info(directory: &EndpointDirectory) -> serde_json::Value {
    match directory.local() {
        Some(descriptor) => serde_json::json!({
            "serving": true,
            "endpoint": descriptor,
        }),
        None => serde_json::json!({
            "serving": false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::EndpointDescriptor;
    use crate::security::SecurityMode;

    #[test]
    fn test_not_serving() {
        let directory = EndpointDirectory::new("node-a");
        let body = server_info(&directory);
        assert_eq!(body["serving"], false);
        assert!(body.get("endpoint").is_none());
    }

    #[test]
    fn test_serving() {
        let directory = EndpointDirectory::new("node-a");
        directory.set_local(EndpointDescriptor::new(
            "node-a",
            "10.0.0.5",
            47470,
            SecurityMode::Tls,
        ));

        let body = server_info(&directory);
        assert_eq!(body["serving"], true);
        assert_eq!(body["endpoint"]["node_id"], "node-a");
        assert_eq!(body["endpoint"]["port"], 47470);
        assert_eq!(body["endpoint"]["security_mode"], "tls");
    }
}
