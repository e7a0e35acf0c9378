//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use super::{Lyrics, LyricsError};
use serde::Deserialize;

/// LRCLIB API response
///
/// The service answers in camelCase; snake_case keys are accepted too.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LrclibResponse {
    #[allow(dead_code)]
    id: Option<i64>,
    #[serde(rename = "trackName", alias = "track_name")]
    pub track_name: Option<String>,
    #[serde(rename = "artistName", alias = "artist_name")]
    pub artist_name: Option<String>,
    #[allow(dead_code)]
    #[serde(rename = "albumName", alias = "album_name")]
    album_name: Option<String>,
    #[allow(dead_code)]
    duration: Option<f64>,
    #[allow(dead_code)]
    instrumental: Option<bool>,
    #[serde(rename = "plainLyrics", alias = "plain_lyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics", alias = "synced_lyrics")]
    pub synced_lyrics: Option<String>,
}

impl LrclibResponse {
    /// Try synced lyrics first, fall back to plain, else an empty set.
    pub fn into_lyrics(self) -> Lyrics {
        if let Some(synced) = &self.synced_lyrics
            && !synced.trim().is_empty()
        {
            return Lyrics::synced(synced);
        }
        if let Some(plain) = &self.plain_lyrics
            && !plain.trim().is_empty()
        {
            return Lyrics::plain(plain);
        }
        Lyrics::default()
    }
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    pub const DEFAULT_USER_AGENT: &'static str =
        "AuraLyrics/0.1.0 (https://github.com/auralyrics/auralyrics)";

    /// Create a new LRCLIB client against `base_url` (no trailing `/get`).
    pub fn new(base_url: &str, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the exact-match lookup URL. Duration is truncated to whole seconds.
    pub fn lookup_url(
        &self,
        track_name: &str,
        artist_name: &str,
        album_name: &str,
        duration_secs: f64,
    ) -> Result<reqwest::Url, LyricsError> {
        let url = format!(
            "{}/get?track_name={}&artist_name={}&album_name={}&duration={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name),
            urlencoding::encode(album_name),
            duration_secs.max(0.0) as u64
        );
        reqwest::Url::parse(&url).map_err(|e| LyricsError::InvalidRequest(format!("{url}: {e}")))
    }

    /// One lookup, no retry.
    pub async fn get_lyrics(
        &self,
        track_name: &str,
        artist_name: &str,
        album_name: &str,
        duration_secs: f64,
    ) -> Result<LrclibResponse, LyricsError> {
        let url = self.lookup_url(track_name, artist_name, album_name, duration_secs)?;
        tracing::debug!(%url, "lrclib lookup");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LyricsError::Network(e.to_string()))?;

        check_status(response.status())?;

        let body = response
            .text()
            .await
            .map_err(|e| LyricsError::Network(e.to_string()))?;
        decode(&body)
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), LyricsError> {
    if status == reqwest::StatusCode::OK {
        Ok(())
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Err(LyricsError::NotFound)
    } else {
        Err(LyricsError::Network(format!("LRCLIB API error: {status}")))
    }
}

fn decode(body: &str) -> Result<LrclibResponse, LyricsError> {
    serde_json::from_str(body).map_err(|e| LyricsError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client() -> LrclibClient {
        LrclibClient::new("https://lrclib.net/api/", LrclibClient::DEFAULT_USER_AGENT).unwrap()
    }

    /// Serve one canned HTTP response on a loopback port and return a client
    /// pointed at it, plus the task that yields the raw request it received.
    async fn canned_server(
        status: &str,
        body: &str,
    ) -> (LrclibClient, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        let client = LrclibClient::new(&format!("http://{addr}/api"), "auralyrics-test").unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn test_get_lyrics_not_found() {
        let (client, server) = canned_server("404 Not Found", "").await;
        let err = client.get_lyrics("Song", "Artist", "", 180.0).await.unwrap_err();
        assert_eq!(err, LyricsError::NotFound);

        let request = server.await.unwrap();
        assert!(request.starts_with(
            "GET /api/get?track_name=Song&artist_name=Artist&album_name=&duration=180 "
        ));
        assert!(request.contains("auralyrics-test"));
    }

    #[tokio::test]
    async fn test_get_lyrics_bad_json_is_decode_error() {
        let (client, server) = canned_server("200 OK", "not json").await;
        let err = client.get_lyrics("Song", "Artist", "", 180.0).await.unwrap_err();
        assert!(matches!(err, LyricsError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_lyrics_server_error_is_network() {
        let (client, server) = canned_server("500 Internal Server Error", "{}").await;
        let err = client.get_lyrics("Song", "Artist", "", 180.0).await.unwrap_err();
        assert!(matches!(err, LyricsError::Network(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_lyrics_over_http() {
        let body = r#"{"trackName":"Song","syncedLyrics":"[00:02.00]two\n[00:01.00]one"}"#;
        let (client, server) = canned_server("200 OK", body).await;
        let lyrics = crate::lyrics::fetch_lyrics(&client, "Song", "Artist", "", 180.0)
            .await
            .unwrap();
        assert!(lyrics.synced);
        let texts: Vec<_> = lyrics.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["one", "two"]);
        server.await.unwrap();
    }

    #[test]
    fn test_lookup_url() {
        let url = client()
            .lookup_url("Bohemian Rhapsody", "Queen", "A Night at the Opera", 354.9)
            .unwrap();
        assert_eq!(url.path(), "/api/get");
        let q: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            q,
            [
                ("track_name".to_string(), "Bohemian Rhapsody".to_string()),
                ("artist_name".to_string(), "Queen".to_string()),
                ("album_name".to_string(), "A Night at the Opera".to_string()),
                ("duration".to_string(), "354".to_string()),
            ]
        );
    }

    #[test]
    fn test_lookup_url_escapes_reserved() {
        let url = client().lookup_url("A&B", "C=D", "", 0.0).unwrap();
        let q: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(q[0].1, "A&B");
        assert_eq!(q[1].1, "C=D");
        assert_eq!(q[2].1, "");
    }

    #[test]
    fn test_bad_base_url_is_invalid_request() {
        let c = LrclibClient::new("not a url", "ua").unwrap();
        assert!(matches!(
            c.lookup_url("a", "b", "c", 1.0),
            Err(LyricsError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(check_status(StatusCode::OK), Ok(()));
        assert_eq!(check_status(StatusCode::NOT_FOUND), Err(LyricsError::NotFound));
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(LyricsError::Network(_))
        ));
        assert!(matches!(
            check_status(StatusCode::NO_CONTENT),
            Err(LyricsError::Network(_))
        ));
    }

    #[test]
    fn test_decode_camel_case_synced() {
        let body = r#"{"id":1,"trackName":"A","artistName":"B","albumName":null,
            "duration":200.0,"instrumental":false,"plainLyrics":"hello\nworld",
            "syncedLyrics":"[00:05.00]world\n[00:00.00]hello"}"#;
        let lyrics = decode(body).unwrap().into_lyrics();
        assert!(lyrics.synced);
        let pairs: Vec<_> = lyrics
            .lines
            .iter()
            .map(|l| (l.timestamp_secs, l.text.as_str()))
            .collect();
        assert_eq!(pairs, [(0.0, "hello"), (5.0, "world")]);
    }

    #[test]
    fn test_decode_snake_case_plain() {
        let body = r#"{"plain_lyrics":"one\n\n  two  \n","synced_lyrics":null}"#;
        let lyrics = decode(body).unwrap().into_lyrics();
        assert!(!lyrics.synced);
        let texts: Vec<_> = lyrics.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["one", "two"]);
    }

    #[test]
    fn test_decode_blank_synced_falls_back_to_plain() {
        let body = r#"{"syncedLyrics":"  \n ","plainLyrics":"only plain"}"#;
        let lyrics = decode(body).unwrap().into_lyrics();
        assert!(!lyrics.synced);
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].text, "only plain");
    }

    #[test]
    fn test_decode_neither_is_empty() {
        let lyrics = decode(r#"{"id":7,"instrumental":true}"#).unwrap().into_lyrics();
        assert!(lyrics.is_empty());
        assert!(!lyrics.synced);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode("<html>oops"), Err(LyricsError::Decode(_))));
        assert!(matches!(
            decode(r#"{"syncedLyrics": 42}"#),
            Err(LyricsError::Decode(_))
        ));
    }
}
