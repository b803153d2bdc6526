//! Per-film collection: cast list plus a bounded, staggered burst of page
//! fetches.
//!
//! Page tasks run at most `concurrency` at a time behind a semaphore, with a
//! randomized pause between submissions so the burst spreads out instead of
//! firing at once. Handles are awaited in page-index order, which keeps the
//! merged comment list deterministic given per-page results. A failed page is
//! zero comments, never an error out of `collect`.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::fetch::CommentFetcher;

/// Everything gathered for one film before processing starts.
#[derive(Debug, Default)]
pub struct CollectedFilm {
    pub comments: Vec<String>,
    pub characters: Vec<String>,
}

pub struct CollectOptions {
    pub page_count: u32,
    pub concurrency: usize,
    pub stagger_ms: (u64, u64),
    pub fetch_cast: bool,
    /// Submissions stop once the deadline passes; completed pages still count.
    pub deadline: Option<Instant>,
}

pub async fn collect(
    fetcher: Arc<CommentFetcher>,
    film_id: &str,
    options: &CollectOptions,
) -> CollectedFilm {
    // Cast fetch failure must not block comment collection.
    let characters = if options.fetch_cast {
        match fetcher.fetch_cast(film_id).await {
            Ok(cast) => cast,
            Err(err) => {
                warn!(film_id, %err, "cast fetch failed, continuing without name blacklist");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut handles = Vec::with_capacity(options.page_count as usize);

    for page in 0..options.page_count {
        if let Some(deadline) = options.deadline {
            if Instant::now() >= deadline {
                warn!(film_id, page, "deadline reached, no further pages submitted");
                break;
            }
        }

        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        let film_id = film_id.to_owned();
        handles.push((
            page,
            tokio::spawn(async move {
                // Closed only on shutdown; treat as an absorbed failure.
                let _permit = semaphore.acquire_owned().await;
                fetcher.fetch_page(&film_id, page).await
            }),
        ));

        stagger(options.stagger_ms).await;
    }

    let mut comments = Vec::new();
    let mut failed_pages = 0u32;
    for (page, handle) in handles {
        match handle.await {
            Ok(Ok(page_comments)) => {
                info!(film_id, page, count = page_comments.len(), "page fetched");
                comments.extend(page_comments);
            }
            Ok(Err(err)) => {
                failed_pages += 1;
                warn!(film_id, page, %err, "page fetch failed, counted as zero comments");
            }
            Err(err) => {
                failed_pages += 1;
                warn!(film_id, page, %err, "page task panicked");
            }
        }
    }

    if failed_pages > 0 {
        warn!(film_id, failed_pages, "collection finished with failed pages");
    }

    CollectedFilm {
        comments,
        characters,
    }
}

async fn stagger(range_ms: (u64, u64)) {
    let (min, max) = range_ms;
    let ms = if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    };
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RequestDispatcher;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Minimal HTTP fixture: routes requests by path substring to canned
    /// responses. Good enough for reqwest over plain http.
    async fn spawn_server(
        routes: Vec<(&'static str, String)>,
    ) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut sock, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = sock.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let body = routes
                        .iter()
                        .find(|(needle, _)| request.contains(*needle))
                        .map(|(_, body)| body.clone());
                    let response = match body {
                        Some(body) => format!(
                            "HTTP/1.1 200 OK\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ),
                        None => "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_owned(),
                    };
                    let _ = sock.write_all(response.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });
        addr
    }

    fn page_html(comments: &[&str]) -> String {
        let spans: String = comments
            .iter()
            .map(|c| format!(r#"<span class="short">{}</span>"#, c))
            .collect();
        format!("<html><body>{}</body></html>", spans)
    }

    fn local_fetcher(addr: std::net::SocketAddr) -> Arc<CommentFetcher> {
        let dispatcher = RequestDispatcher::new("https://movie.douban.com/", vec![]);
        Arc::new(CommentFetcher::new(
            dispatcher,
            format!("http://{}", addr),
            5,
            (0, 0),
        ))
    }

    fn options(pages: u32) -> CollectOptions {
        CollectOptions {
            page_count: pages,
            concurrency: 3,
            stagger_ms: (0, 0),
            fetch_cast: true,
            deadline: None,
        }
    }

    fn unreachable_fetcher() -> Arc<CommentFetcher> {
        // Reserved TEST-NET address with a 1s timeout: every request fails fast.
        let dispatcher = RequestDispatcher::new("https://movie.douban.com/", vec![]);
        Arc::new(CommentFetcher::new(
            dispatcher,
            "http://192.0.2.1",
            1,
            (0, 0),
        ))
    }

    #[tokio::test]
    async fn test_failed_pages_become_zero_comments() {
        let collected = collect(unreachable_fetcher(), "12345", &options(2)).await;
        assert!(collected.comments.is_empty());
        assert!(collected.characters.is_empty());
    }

    #[tokio::test]
    async fn test_cast_failure_does_not_block_comments() {
        // Celebrities route missing -> 500; comment pages succeed.
        let addr = spawn_server(vec![(
            "/comments",
            page_html(&["这部电影真好看", "太差了，浪费时间"]),
        )])
        .await;
        let collected = collect(local_fetcher(addr), "12345", &options(1)).await;
        assert!(collected.characters.is_empty());
        assert_eq!(
            collected.comments,
            vec!["这部电影真好看", "太差了 浪费时间"]
        );
    }

    #[tokio::test]
    async fn test_pages_merge_in_page_index_order() {
        let addr = spawn_server(vec![
            ("start=0", page_html(&["第一页评论"])),
            ("start=20", page_html(&["第二页评论"])),
            ("/celebrities", "<html></html>".to_owned()),
        ])
        .await;
        let mut opts = options(2);
        opts.fetch_cast = false;
        let collected = collect(local_fetcher(addr), "12345", &opts).await;
        assert_eq!(collected.comments, vec!["第一页评论", "第二页评论"]);
    }

    #[tokio::test]
    async fn test_deadline_stops_submissions() {
        let mut opts = options(50);
        opts.deadline = Some(Instant::now());
        let collected = collect(unreachable_fetcher(), "12345", &opts).await;
        assert!(collected.comments.is_empty());
    }
}
