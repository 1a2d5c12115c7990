#![allow(dead_code)]

use tws::config::{DockerConnection, FleetConfig};
use tws::config::model::{DEFAULT_IMAGE, DEFAULT_NAME_PREFIX};
use tws::fleet::LaunchTemplate;
use tws::types::Protocol;
use url::Url;

/// Builder for `LaunchTemplate` with the CLI defaults pre-filled.
pub struct LaunchTemplateBuilder {
    template: LaunchTemplate,
}

impl LaunchTemplateBuilder {
    pub fn new(target: &str) -> Self {
        Self {
            template: LaunchTemplate {
                target: Url::parse(target).expect("test target must be a valid URL"),
                method: "GET".to_string(),
                concurrency: 100,
                requests: 10_000,
                timeout_secs: 30,
                timelimit_secs: 0,
                verbosity: 3,
                protocol: Protocol::default(),
                auth: None,
                proxy_auth: None,
                content_type: None,
                headers: vec![],
                cookies: vec![],
            },
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.template.method = method.to_string();
        self
    }

    pub fn header(mut self, header: &str) -> Self {
        self.template.headers.push(header.to_string());
        self
    }

    pub fn cookie(mut self, cookie: &str) -> Self {
        self.template.cookies.push(cookie.to_string());
        self
    }

    pub fn auth(mut self, auth: &str) -> Self {
        self.template.auth = Some(auth.to_string());
        self
    }

    pub fn proxy_auth(mut self, auth: &str) -> Self {
        self.template.proxy_auth = Some(auth.to_string());
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.template.content_type = Some(content_type.to_string());
        self
    }

    pub fn timelimit(mut self, secs: u32) -> Self {
        self.template.timelimit_secs = secs;
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.template.protocol = protocol;
        self
    }

    pub fn build(self) -> LaunchTemplate {
        self.template
    }
}

/// Builder for `FleetConfig`.
pub struct FleetConfigBuilder {
    config: FleetConfig,
}

impl FleetConfigBuilder {
    pub fn new(containers: usize) -> Self {
        Self {
            config: FleetConfig {
                containers,
                image: DEFAULT_IMAGE.to_string(),
                name_prefix: DEFAULT_NAME_PREFIX.to_string(),
                docker: DockerConnection::default(),
                template: LaunchTemplateBuilder::new("http://target.test").build(),
            },
        }
    }

    pub fn template(mut self, template: LaunchTemplate) -> Self {
        self.config.template = template;
        self
    }

    pub fn name_prefix(mut self, prefix: &str) -> Self {
        self.config.name_prefix = prefix.to_string();
        self
    }

    pub fn build(self) -> FleetConfig {
        self.config
    }
}
