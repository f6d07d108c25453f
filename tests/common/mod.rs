#![allow(dead_code)]

pub mod descriptors {
    use prost::Message;
    use scaffolder::descriptor::proto::{
        CodeGeneratorRequest, FileDescriptor, FileDescriptorSet, HttpRule, MethodDescriptor,
        MethodOptions, ServiceDescriptor,
    };

    pub fn get(path: &str) -> HttpRule {
        HttpRule {
            get: Some(path.to_string()),
            ..Default::default()
        }
    }

    pub fn post(path: &str, body: &str) -> HttpRule {
        HttpRule {
            post: Some(path.to_string()),
            body: body.to_string(),
            ..Default::default()
        }
    }

    /// Method with `<name>Request`/`<name>Reply` messages in package `api.v1`
    pub fn method(name: &str, rule: Option<HttpRule>) -> MethodDescriptor {
        MethodDescriptor {
            name: Some(name.to_string()),
            input_type: Some(format!(".api.v1.{name}Request")),
            output_type: Some(format!(".api.v1.{name}Reply")),
            options: rule.map(|http| MethodOptions {
                deprecated: None,
                http: Some(http),
            }),
            client_streaming: None,
            server_streaming: None,
        }
    }

    pub fn streaming(mut method: MethodDescriptor, client: bool, server: bool) -> MethodDescriptor {
        method.client_streaming = Some(client);
        method.server_streaming = Some(server);
        method
    }

    pub fn service(name: &str, methods: Vec<MethodDescriptor>) -> ServiceDescriptor {
        ServiceDescriptor {
            name: Some(name.to_string()),
            method: methods,
        }
    }

    pub fn file(name: &str, services: Vec<ServiceDescriptor>) -> FileDescriptor {
        FileDescriptor {
            name: Some(name.to_string()),
            package: Some("api.v1".to_string()),
            service: services,
        }
    }

    /// `api/v1/order.proto` with `GET /v1/orders/{id}` bound to `GetOrder`
    pub fn order_file() -> FileDescriptor {
        file(
            "api/v1/order.proto",
            vec![service(
                "Order",
                vec![method("GetOrder", Some(get("/v1/orders/{id}")))],
            )],
        )
    }

    pub fn descriptor_set(files: &[Vec<u8>]) -> Vec<u8> {
        FileDescriptorSet {
            file: files.to_vec(),
        }
        .encode_to_vec()
    }

    pub fn request(files_to_generate: &[&str], files: &[Vec<u8>], parameter: &str) -> Vec<u8> {
        CodeGeneratorRequest {
            file_to_generate: files_to_generate.iter().map(|f| f.to_string()).collect(),
            parameter: Some(parameter.to_string()),
            proto_file: files.to_vec(),
        }
        .encode_to_vec()
    }

    pub fn encode(file: &FileDescriptor) -> Vec<u8> {
        file.encode_to_vec()
    }
}

pub mod schemas {
    /// `t_order` with exactly three columns
    pub const ORDER_DDL: &str = r#"
CREATE TABLE `t_order` (
  `id` bigint unsigned NOT NULL AUTO_INCREMENT,
  `amount` decimal(10,2) NOT NULL COMMENT 'order amount',
  `note` varchar(255) DEFAULT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;

CREATE TABLE `t_user_profile` (
  `id` bigint NOT NULL AUTO_INCREMENT,
  `nick_name` varchar(32) NOT NULL,
  `created_at` datetime DEFAULT NULL,
  `updated_at` datetime DEFAULT NULL,
  `deleted_at` datetime DEFAULT NULL,
  PRIMARY KEY (`id`)
);
"#;
}

pub mod fs_util {
    use std::fs;
    use std::path::{Path, PathBuf};
    use walkdir::WalkDir;

    /// Every file under `root`, relative, sorted
    pub fn files(root: &Path) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        out.sort();
        out
    }

    pub fn read(path: impl AsRef<Path>) -> String {
        fs::read_to_string(path.as_ref())
            .unwrap_or_else(|e| panic!("reading {}: {e}", path.as_ref().display()))
    }

    pub fn write(path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}
