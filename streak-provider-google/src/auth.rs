//! Browser-based OAuth authorization for Google Calendar.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::session::{Credentials, Session, SessionData};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// Run the consent flow and store the resulting session at `session_path`.
pub async fn authorize(session_path: &Path) -> Result<Session> {
    let mut client = Credentials::load()?.client("", "");

    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
    let auth_url = client.user_consent_url(&scopes);

    // Bind before showing the URL so a fast browser can't beat us.
    let listener = TcpListener::bind(redirect_address())
        .await
        .with_context(|| format!("Failed to bind to port {}", REDIRECT_PORT))?;

    if open::that(&auth_url).is_ok() {
        eprintln!("Your browser has been opened to an authorization URL:");
    } else {
        eprintln!("Visit the URL below to authenticate this program:");
    }
    eprintln!("\n{}\n", auth_url);
    eprintln!("This program will resume once authenticated.");

    let (code, state) = wait_for_callback(&listener).await?;

    let tokens = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange code for tokens")?;

    let session = Session::new(session_path, SessionData::from(&tokens));
    session.save()?;

    eprintln!("Authentication successful!");

    Ok(session)
}

/// Load the cached session, running the consent flow first if there is none.
pub async fn load_or_authorize(session_path: &Path) -> Result<Session> {
    if session_path.exists() {
        Session::load_valid(session_path).await
    } else {
        authorize(session_path).await
    }
}

/// Accept connections until one carries the OAuth `code` and `state`.
async fn wait_for_callback(listener: &TcpListener) -> Result<(String, String)> {
    loop {
        let (mut stream, _) = listener.accept().await.context("Failed to accept connection")?;

        let mut request_line = String::new();
        BufReader::new(&mut stream).read_line(&mut request_line).await?;

        match parse_callback(&request_line) {
            Some(params) => {
                let response = "HTTP/1.1 200 OK\r\n\
                    Content-Type: text/html\r\n\
                    Connection: close\r\n\
                    \r\n\
                    <html><body>\
                    <h1>Success</h1>\
                    <p>Authorized. You may now close this browser window.</p>\
                    </body></html>";
                stream.write_all(response.as_bytes()).await?;
                stream.flush().await?;
                return Ok(params);
            }
            None => {
                // favicon and the like
                stream
                    .write_all(b"HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\n")
                    .await?;
            }
        }
    }
}

/// Extract `(code, state)` from a request line like `GET /callback?code=..&state=.. HTTP/1.1`.
fn parse_callback(request_line: &str) -> Option<(String, String)> {
    let target = request_line.split_whitespace().nth(1)?;
    let url = url::Url::parse(&format!("http://localhost{}", target)).ok()?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    Some((param("code")?, param("state")?))
}
