/// REST client for the generator backend.
///
/// Every endpoint takes and returns JSON except `get_image`, which answers
/// with PNG bytes. Status codes are interpreted here and nowhere else.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{
    BackendMessage, ClimateRequest, GenerationConfig, LayerList, LoadRequest, ResizeRequest,
    SaveRequest, ViewConfig, WaterLevelRequest, WorldSize,
};
use crate::error::{Error, Result};

/// Handle to the backend. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// `base_url` must end with `/`, endpoint names are appended to it.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate(&self, config: &GenerationConfig) -> Result<BackendMessage> {
        self.call_json(Method::POST, "generate", Some(config)).await
    }

    pub async fn generate_from_image(&self, request: &LoadRequest) -> Result<BackendMessage> {
        self.call_json(Method::POST, "generate_from_image", Some(request))
            .await
    }

    pub async fn load(&self, request: &LoadRequest) -> Result<BackendMessage> {
        self.call_json(Method::POST, "load", Some(request)).await
    }

    pub async fn save(&self, request: &SaveRequest) -> Result<BackendMessage> {
        self.call_json(Method::POST, "save", Some(request)).await
    }

    /// Render every rotation frame of a view into `config.output_path`
    /// on the backend's filesystem.
    pub async fn draw(&self, config: &ViewConfig) -> Result<BackendMessage> {
        self.call_json(Method::GET, "draw", Some(config)).await
    }

    /// Render a single frame at `config.center` and return it as PNG bytes.
    pub async fn get_image(&self, config: &ViewConfig) -> Result<Vec<u8>> {
        let response = self.send(Method::GET, "get_image", Some(config)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn add_noise(&self) -> Result<BackendMessage> {
        self.call_json::<(), _>(Method::POST, "add_noise", None).await
    }

    pub async fn erosion(&self) -> Result<BackendMessage> {
        self.call_json::<(), _>(Method::POST, "erosion", None).await
    }

    pub async fn smooth(&self) -> Result<BackendMessage> {
        self.call_json::<(), _>(Method::POST, "smooth", None).await
    }

    pub async fn translation_noise(&self) -> Result<BackendMessage> {
        self.call_json::<(), _>(Method::POST, "translation_noise", None)
            .await
    }

    pub async fn adjust_water_percentage(
        &self,
        request: &WaterLevelRequest,
    ) -> Result<BackendMessage> {
        self.call_json(Method::POST, "adjust_water_percentage", Some(request))
            .await
    }

    pub async fn calculate_climate(&self, request: &ClimateRequest) -> Result<BackendMessage> {
        self.call_json(Method::POST, "calculate_climate", Some(request))
            .await
    }

    pub async fn resize(&self, request: &ResizeRequest) -> Result<BackendMessage> {
        self.call_json(Method::POST, "resize", Some(request)).await
    }

    pub async fn get_size(&self) -> Result<WorldSize> {
        self.call_json::<(), _>(Method::GET, "get_size", None).await
    }

    pub async fn get_layers(&self) -> Result<Vec<String>> {
        let list: LayerList = self.call_json::<(), _>(Method::GET, "get_layers", None).await?;
        Ok(list.layers)
    }

    async fn call_json<B, T>(
        &self,
        method: Method,
        endpoint: &'static str,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, endpoint, body).await?;
        let reply = response.json::<T>().await?;
        Ok(reply)
    }

    /// Single request, no retry. Non-2xx becomes `Error::Status`.
    async fn send<B>(
        &self,
        method: Method,
        endpoint: &'static str,
        body: Option<&B>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        log::debug!("{} -> {}", endpoint, status);
        if !status.is_success() {
            return Err(Error::Status { endpoint, status });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::Shape;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    fn ok_message(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "message": text }))
    }

    #[tokio::test]
    async fn test_generate_posts_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({ "shape": "Cylinder", "seed": 7 })))
            .respond_with(ok_message("Generated map 7"))
            .expect(1)
            .mount(&server)
            .await;

        let config = GenerationConfig {
            shape: Shape::Cylinder,
            seed: 7,
            ..GenerationConfig::default()
        };
        let reply = client_for(&server).generate(&config).await.unwrap();
        assert_eq!(reply.message, "Generated map 7");
    }

    #[tokio::test]
    async fn test_body_less_operations() {
        let server = MockServer::start().await;
        for endpoint in ["add_noise", "erosion", "smooth", "translation_noise"] {
            Mock::given(method("POST"))
                .and(path(format!("/{}", endpoint)))
                .respond_with(ok_message(endpoint))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server);
        assert_eq!(client.add_noise().await.unwrap().message, "add_noise");
        assert_eq!(client.erosion().await.unwrap().message, "erosion");
        assert_eq!(client.smooth().await.unwrap().message, "smooth");
        assert_eq!(
            client.translation_noise().await.unwrap().message,
            "translation_noise"
        );
    }

    #[tokio::test]
    async fn test_parameterised_operations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/adjust_water_percentage"))
            .and(body_json(json!({ "percentage": 60.0 })))
            .respond_with(ok_message("ok"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resize"))
            .and(body_json(json!({ "factor": 2.0 })))
            .respond_with(ok_message("ok"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/calculate_climate"))
            .and(body_json(json!({
                "pole_temperature": -35.0,
                "equator_temperature": 25.0,
                "humidity": 1.0
            })))
            .respond_with(ok_message("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .adjust_water_percentage(&WaterLevelRequest { percentage: 60.0 })
            .await
            .unwrap();
        client.resize(&ResizeRequest { factor: 2.0 }).await.unwrap();
        client
            .calculate_climate(&ClimateRequest {
                pole_temperature: -35.0,
                equator_temperature: 25.0,
                humidity: 1.0,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_image_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_image"))
            .and(body_partial_json(json!({ "center": [0.0, 90.0] })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let config = crate::state::forms::NewViewForm::default()
            .to_config(std::path::Path::new("out"))
            .at_longitude(90.0);
        let bytes = client_for(&server).get_image(&config).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_size_and_layers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_size"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "width": 2000, "height": 1000 })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/get_layers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "layers": ["height", "climate"] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(
            client.get_size().await.unwrap(),
            WorldSize {
                width: 2000,
                height: 1000
            }
        );
        assert_eq!(client.get_layers().await.unwrap(), vec!["height", "climate"]);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/save"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .save(&SaveRequest {
                world_name: "earth".into(),
                path: "earth.bin".into(),
            })
            .await;
        match result {
            Err(Error::Status { endpoint, status }) => {
                assert_eq!(endpoint, "save");
                assert_eq!(status.as_u16(), 500);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client =
            BackendClient::new("http://127.0.0.1:9/", Duration::from_millis(500)).unwrap();
        assert!(matches!(client.smooth().await, Err(Error::Http(_))));
    }
}
