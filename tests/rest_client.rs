// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the REST transport and hub readers using wiremock.

use std::time::Duration;

use fibaro_lib::{
    ApiVersion, ClientConfig, Error, FibaroClient, FibaroConnection, FibaroId, ProtocolError,
    data_helper,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_url(server: &MockServer) -> String {
    format!("{}/api/", server.uri())
}

async fn mount_get(server: &MockServer, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_login(server: &MockServer, serial_number: &str) {
    mount_get(server, "loginStatus", json!({"status": true, "username": "admin"})).await;
    mount_get(
        server,
        "settings/info",
        json!({
            "serialNumber": serial_number,
            "hcName": serial_number,
            "mac": "ac:17:02:0d:35:c8",
            "softVersion": "5.090.17",
        }),
    )
    .await;
}

// ============================================================================
// RestClient Tests
// ============================================================================

mod rest_client {
    use super::*;

    #[tokio::test]
    async fn get_sends_headers_and_decodes_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/settings/info"))
            .and(header("authorization", "Basic YWRtaW46YWRtaW4="))
            .and(header("content-type", "application/json; charset=utf-8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serialNumber": "HC3-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClientConfig::new(api_url(&server))
            .with_credentials("admin", "admin")
            .into_rest_client()
            .unwrap();

        let body = client.get("settings/info", None).await.unwrap();
        assert_eq!(body, Some(json!({"serialNumber": "HC3-1"})));
    }

    #[tokio::test]
    async fn empty_body_yields_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/scenes/5/execute"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = ClientConfig::new(api_url(&server)).into_rest_client().unwrap();

        let body = client.post("scenes/5/execute", None, None).await.unwrap();
        assert_eq!(body, None);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/devices"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ClientConfig::new(api_url(&server)).into_rest_client().unwrap();

        let err = client.get("devices", None).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(matches!(err, ProtocolError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn per_call_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/devices"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = ClientConfig::new(api_url(&server)).into_rest_client().unwrap();

        let err = client
            .get("devices", Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Http(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn close_aborts_in_flight_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/devices"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = ClientConfig::new(api_url(&server)).into_rest_client().unwrap();

        let request = tokio::spawn({
            let client = client.clone();
            async move { client.get("devices", None).await }
        });

        tokio::time::timeout(Duration::from_secs(2), async {
            while server.received_requests().await.unwrap_or_default().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        client.close();

        let result = tokio::time::timeout(Duration::from_secs(1), request)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(ProtocolError::Closed)));
    }
}

// ============================================================================
// Client and Reader Tests
// ============================================================================

mod readers {
    use super::*;

    #[tokio::test]
    async fn connect_detects_api_version() {
        let server = MockServer::start().await;
        mount_login(&server, "HC2-012345").await;

        let client = FibaroClient::new(ClientConfig::new(api_url(&server))).unwrap();
        assert!(client.connect().await.unwrap());
        assert_eq!(client.api_version(), ApiVersion::V4);
    }

    #[tokio::test]
    async fn read_devices_skips_ignored_entries() {
        let server = MockServer::start().await;
        mount_get(
            &server,
            "devices",
            json!([
                {"id": 2, "name": "admin", "type": "HC_user"},
                {"id": 4, "name": "Phone", "type": "iOS_device"},
                {"id": 5, "type": "com.fibaro.binarySwitch"},
                {"id": 28, "name": "Plug", "type": "com.fibaro.binarySwitch", "properties": {"value": false}},
            ]),
        )
        .await;

        let client = FibaroClient::new(ClientConfig::new(api_url(&server))).unwrap();
        let devices = client.read_devices().await.unwrap();

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name(), "Plug");
        assert_eq!(devices[0].value().bool_value(), Ok(false));
    }

    #[tokio::test]
    async fn read_rooms_as_map() {
        let server = MockServer::start().await;
        mount_get(
            &server,
            "rooms",
            json!([
                {"id": 219, "name": "Kitchen"},
                {"id": 220, "name": "Living room"},
            ]),
        )
        .await;

        let client = FibaroClient::new(ClientConfig::new(api_url(&server))).unwrap();
        let rooms = data_helper::read_rooms(&client).await.unwrap();

        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[&FibaroId::new(219)], "Kitchen");
    }

    #[tokio::test]
    async fn scene_actions_v4() {
        let server = MockServer::start().await;
        mount_login(&server, "HC2-012345").await;
        mount_get(&server, "scenes", json!([{"id": 5, "name": "Good night"}])).await;

        Mock::given(method("POST"))
            .and(path("/api/scenes/5/action/start"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/scenes/5/action/stop"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = FibaroClient::new(ClientConfig::new(api_url(&server))).unwrap();
        client.connect().await.unwrap();

        let scenes = data_helper::read_scenes(&client).await.unwrap();
        assert_eq!(scenes[0].name(), "Good night");
        scenes[0].start().await.unwrap();
        scenes[0].stop().await.unwrap();
    }

    #[tokio::test]
    async fn scene_actions_v5() {
        let server = MockServer::start().await;
        mount_login(&server, "HC3-00012345").await;
        mount_get(&server, "scenes", json!([{"id": 7, "name": "Morning"}])).await;

        Mock::given(method("POST"))
            .and(path("/api/scenes/7/execute"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/scenes/7/kill"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = FibaroClient::new(ClientConfig::new(api_url(&server))).unwrap();
        client.connect().await.unwrap();

        let scenes = client.read_scenes().await.unwrap();
        scenes[0].start().await.unwrap();
        scenes[0].stop().await.unwrap();
    }

    #[tokio::test]
    async fn execute_action_posts_arguments() {
        let server = MockServer::start().await;
        mount_get(
            &server,
            "devices",
            json!([{
                "id": 3,
                "name": "Dimmer",
                "actions": {"setValue": 1, "turnOn": 0},
                "properties": {"value": 0},
            }]),
        )
        .await;

        Mock::given(method("POST"))
            .and(path("/api/devices/3/action/setValue"))
            .and(body_json(json!({"args": [50]})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/devices/3/action/turnOn"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = FibaroClient::new(ClientConfig::new(api_url(&server))).unwrap();
        let devices = client.read_devices().await.unwrap();

        devices[0]
            .execute_action("setValue", &[json!(50)])
            .await
            .unwrap();
        devices[0].execute_action("turnOn", &[]).await.unwrap();
    }
}

// ============================================================================
// FibaroConnection Tests
// ============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn connect_returns_hub_info() {
        let server = MockServer::start().await;
        mount_login(&server, "YH-00012345").await;

        let connection = FibaroConnection::new(ClientConfig::new(api_url(&server))).unwrap();
        assert!(matches!(connection.fibaro_client(), Err(Error::NotConnected)));

        let info = connection.connect("admin", "admin").await.unwrap();
        assert_eq!(info.model_name(), "Yubii Home");
        assert_eq!(info.manufacturer_name(), "Yubii");

        let client = connection.fibaro_client().unwrap();
        assert_eq!(client.api_version(), ApiVersion::V5);
    }

    #[tokio::test]
    async fn forbidden_maps_to_authentication_failed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/loginStatus"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let connection = FibaroConnection::new(ClientConfig::new(api_url(&server))).unwrap();

        let err = connection.connect("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
        assert!(connection.fibaro_client().is_err());
    }

    #[tokio::test]
    async fn server_error_maps_to_connect_failed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/loginStatus"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let connection = FibaroConnection::new(ClientConfig::new(api_url(&server))).unwrap();

        let err = connection.connect("admin", "admin").await.unwrap_err();
        assert!(matches!(err, Error::ConnectFailed(_)));
    }
}
