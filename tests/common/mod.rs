#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;
use tiny_http::{Header, Response, Server};

pub const API_KEY: &str = "secret";

/// Local stand-in for the data service. Serves one acquisition with two
/// functional echoes (given out of order), a structural image and a session.
pub struct MockService {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<String>>>,
}

pub fn echo_files() -> HashMap<&'static str, &'static [u8]> {
    let mut files: HashMap<&'static str, &'static [u8]> = HashMap::new();
    files.insert("echo 2.nii.gz", b"second echo");
    files.insert("echo1.nii.gz", b"first echo");
    files
}

pub fn start() -> MockService {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let url = request.url().to_string();
            seen.lock().unwrap().push(url.clone());

            let authorized = request.headers().iter().any(|h| {
                h.field.equiv("Authorization") && h.value.as_str() == format!("scitran-user {}", API_KEY)
            });
            if !authorized {
                let _ = request.respond(Response::from_string("unauthorized").with_status_code(401));
                continue;
            }

            let json_header: Header = "Content-Type: application/json".parse().unwrap();
            let response = match url.as_str() {
                "/api/acquisitions/acq1" => Response::from_string(
                    json!({
                        "_id": "acq1",
                        "label": "rest ME",
                        "parents": { "session": "ses1" },
                        "files": [
                            {
                                "name": "echo 2.nii.gz",
                                "type": "nifti",
                                "classification": { "Intent": ["Functional"] },
                                "info": { "EchoTime": 0.0385 }
                            },
                            {
                                "name": "t1.nii.gz",
                                "type": "nifti",
                                "classification": { "Intent": ["Structural"] },
                                "info": { "EchoTime": 0.003 }
                            },
                            {
                                "name": "echo1.nii.gz",
                                "type": "nifti",
                                "classification": { "Intent": ["Functional"] },
                                "info": { "EchoTime": 0.014 }
                            }
                        ]
                    })
                    .to_string(),
                )
                .with_header(json_header),
                "/api/sessions/ses1" => {
                    Response::from_string(json!({ "subject": { "code": "sub 01" } }).to_string())
                        .with_header(json_header)
                }
                "/api/acquisitions/acq1/files/echo1.nii.gz" => {
                    Response::from_data(echo_files()["echo1.nii.gz"].to_vec())
                }
                "/api/acquisitions/acq1/files/echo%202.nii.gz" => {
                    Response::from_data(echo_files()["echo 2.nii.gz"].to_vec())
                }
                _ => Response::from_string("not found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    MockService {
        base_url: format!("http://{}/api", addr),
        requests,
    }
}
