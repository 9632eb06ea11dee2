#![allow(dead_code)]
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::time::Duration;

/// HTTP server answering a single request with a canned response
pub struct MockServer {
    pub base_url: url::Url,
    requests: mpsc::Receiver<Vec<String>>,
}

impl MockServer {
    pub fn once(status: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream);
            let mut head = Vec::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                head.push(line);
            }
            let _ = reader.get_mut().write_all(response.as_bytes());
            let _ = reader.get_mut().flush();
            let _ = tx.send(head);
        });

        Self {
            base_url: url::Url::parse(&format!("http://{addr}/")).expect("mock server url"),
            requests: rx,
        }
    }

    /// Request line and headers of the request that was served
    pub fn request(&self) -> Vec<String> {
        self.requests
            .recv_timeout(Duration::from_secs(10))
            .expect("no request received")
    }

    /// Header value, names are compared case insensitively
    pub fn header(request: &[String], name: &str) -> Option<String> {
        request.iter().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// Address nothing listens on
pub fn closed_base_url() -> url::Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    url::Url::parse(&format!("http://{addr}/")).expect("url")
}

pub const SAMPLE: &str = r#"[
    {
        "id": 101,
        "traceNo": "BX-7781",
        "user": {"account": "CORP\\anna", "fullName": "Anna Øberg"},
        "computer": {"name": "LT-0042", "platform": "Windows"},
        "status": "Finished",
        "application": {"name": "Visual Studio Installer"},
        "requestTime": "2024-03-27T08:12:44Z",
        "elevatedApplications": [
            {
                "name": "Visual Studio Installer",
                "path": "C:\\Program Files (x86)\\Microsoft Visual Studio\\Installer",
                "file": "setup.exe",
                "version": "3.9.2164",
                "vendor": "Microsoft Corporation",
                "scanResult": "Clean",
                "virustotalLink": "https://www.virustotal.com/gui/file/abc"
            },
            {
                "name": "vs_installershell",
                "file": "vs_installershell.exe",
                "vendor": "Microsoft Corporation"
            }
        ]
    },
    {
        "id": 102,
        "traceNo": "BX-7782",
        "status": "Denied",
        "requestTime": "2024-03-27T09:01:10Z",
        "elevatedApplications": []
    }
]"#;
