#![allow(dead_code)]

use std::io::{Cursor, Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

/// One filing rendered as the header and body documents of an unpacked archive.
#[derive(Debug, Clone)]
pub struct FilingFixture<'a> {
    pub kind: &'a str,
    pub holder: &'a str,
    pub company: Option<&'a str>,
    pub code: &'a str,
    pub ratio_before: &'a str,
    pub ratio_after: &'a str,
    pub shares: &'a str,
    pub purpose: &'a str,
    pub report_date: &'a str,
    pub submission_date: &'a str,
}

impl Default for FilingFixture<'static> {
    fn default() -> Self {
        Self {
            kind: "変更報告書",
            holder: "株式会社光通信",
            company: Some("株式会社サンプル商事"),
            code: "12340",
            ratio_before: "5.10%",
            ratio_after: "6.35%",
            shares: "1,234,500",
            purpose: "純投資",
            report_date: "2025年4月4日",
            submission_date: "2025年4月11日",
        }
    }
}

impl FilingFixture<'_> {
    pub fn header_html(&self) -> String {
        format!(
            r#"<!doctype html>
<html><head><title>{kind}</title></head><body>
<table>
<tr><td>【表紙】</td><td></td></tr>
<tr><td>【提出書類】</td><td>{kind}</td></tr>
<tr><td>【氏名又は名称】</td><td>{holder}</td></tr>
<tr><td>【報告義務発生日】</td><td>{report_date}</td></tr>
<tr><td>【提出日】</td><td>{submission_date}</td></tr>
</table>
</body></html>
"#,
            kind = self.kind,
            holder = self.holder,
            report_date = self.report_date,
            submission_date = self.submission_date,
        )
    }

    pub fn body_html(&self) -> String {
        let company = self
            .company
            .map(|company| format!(r#"<p id="T0100000000101">{company}</p>"#))
            .unwrap_or_default();
        format!(
            r#"<!doctype html>
<html><body>
{company}
<p id="T0100000000201">{code}</p>
<p id="T0201010100401">{holder}</p>
<p id="T0201040200301">{before}</p>
<p id="T0201040200201">{after}</p>
<p id="T0201040101401">{shares}</p>
<p id="T0201020000101">{purpose}</p>
</body></html>
"#,
            code = self.code,
            holder = self.holder,
            before = self.ratio_before,
            after = self.ratio_after,
            shares = self.shares,
            purpose = self.purpose,
        )
    }

    /// Writes `{root}/{doc_id}/XBRL/PublicDoc/{header,honbun}.htm` and returns the bundle dir.
    pub fn write_bundle(&self, root: &Path, doc_id: &str) -> PathBuf {
        let dir = root.join(doc_id).join("XBRL").join("PublicDoc");
        std::fs::create_dir_all(&dir).expect("create bundle dir");
        std::fs::write(dir.join("0000000_header_jplvh010000.htm"), self.header_html())
            .expect("write header");
        std::fs::write(dir.join("0101010_honbun_jplvh010000.htm"), self.body_html())
            .expect("write body");
        dir
    }

    /// The bundle packed the way the download endpoint serves it.
    pub fn zip_bytes(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, contents) in [
            (
                "XBRL/PublicDoc/0000000_header_jplvh010000.htm",
                self.header_html(),
            ),
            (
                "XBRL/PublicDoc/0101010_honbun_jplvh010000.htm",
                self.body_html(),
            ),
        ] {
            zip.start_file(name, options).expect("start zip entry");
            zip.write_all(contents.as_bytes()).expect("write zip entry");
        }
        zip.finish().expect("finish zip").into_inner()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: value.to_string().into_bytes(),
        }
    }

    pub fn zip(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            body,
        }
    }

    pub fn status(status: u16, text: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: text.as_bytes().to_vec(),
        }
    }
}

/// Local HTTP server answering through `handler` and recording every request.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    pub fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> StubResponse + Send + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start stub server");
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let authorization = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Authorization"))
                    .map(|header| header.value.as_str().to_owned());
                let seen = RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    authorization,
                    body,
                };

                let reply = handler(&seen);
                recorded.lock().expect("lock").push(seen);

                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    reply.content_type.as_bytes(),
                )
                .expect("build header");
                let response = tiny_http::Response::from_data(reply.body)
                    .with_status_code(reply.status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// `stakewatch` with every environment fallback cleared so host settings never leak in.
pub fn stakewatch(download_dir: &Path, db: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("stakewatch");
    for var in [
        "DOWNLOAD_DIR",
        "STAKEWATCH_DB",
        "STAKEWATCH_STORE",
        "EDINET_API_KEY",
        "EDINET_API_BASE",
        "EDINET_CODE",
        "STAKEWATCH_TARGET_NAME",
        "LINE_CHANNEL_ACCESS_TOKEN",
        "LINE_USER_ID",
        "LINE_API_BASE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--download-dir")
        .arg(download_dir)
        .arg("--db")
        .arg(db);
    cmd
}
