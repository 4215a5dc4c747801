use anyhow::{Context, Result};
use reqwest::{header, Client, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};
use ticketdesk::{
    api::{app, handlers::auth::AuthConfig, Backends, ServiceConfig},
    credentials::{hash_secret, CredentialStore, MemoryCredentialStore},
    notify::LogNotifier,
    tickets::{MemoryTicketStore, NewTicket, TicketStore},
};
use tokio::net::TcpListener;

struct Server {
    base: String,
    credentials: Arc<MemoryCredentialStore>,
    alice_ticket: i64,
    bob_ticket: i64,
    uploads_root: PathBuf,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.uploads_root);
    }
}

async fn spawn_server() -> Result<Server> {
    let uploads_root = std::env::temp_dir().join(format!("ticketdesk-{}", ulid::Ulid::new()));
    std::fs::create_dir_all(uploads_root.join("uploads"))?;
    std::fs::write(uploads_root.join("uploads/alice.txt"), b"alice's log")?;
    std::fs::write(uploads_root.join("uploads/bob.pdf"), b"%PDF-1.4 bob")?;
    std::fs::write(uploads_root.join("secret.txt"), b"not served")?;

    let credentials = Arc::new(MemoryCredentialStore::new());
    credentials.insert("tech@example.com", &hash_secret("tech-pass1"), Some("Tina"), Some("Tecnico"))?;
    // Plaintext row from before hashing was introduced.
    credentials.insert("alice@example.com", "alice-pass1", Some("Alice"), None)?;
    credentials.insert("bob@example.com", &hash_secret("bob-pass1"), Some("Bob"), Some("Usuario"))?;

    let tickets = Arc::new(MemoryTicketStore::new());
    let alice_ticket = tickets
        .create(&NewTicket {
            requester_name: "Alice".to_string(),
            email: "Alice@Example.com".to_string(),
            description: "Printer on fire".to_string(),
            attachment: Some("/uploads/alice.txt".to_string()),
            ..NewTicket::default()
        })
        .await?
        .id;
    let bob_ticket = tickets
        .create(&NewTicket {
            requester_name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            description: "VPN down".to_string(),
            attachment: Some("\\uploads\\bob.pdf".to_string()),
            ..NewTicket::default()
        })
        .await?
        .id;

    let config = ServiceConfig::new(AuthConfig::new(SecretString::from(
        "integration-secret-0123456789abcdef",
    )))
    .with_uploads_root(uploads_root.clone());
    let backends = Backends {
        credentials: credentials.clone(),
        tickets,
        notifier: Arc::new(LogNotifier),
    };
    let router = app(&config, backends);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router.into_make_service()).await;
    });

    Ok(Server {
        base: format!("http://{addr}"),
        credentials,
        alice_ticket,
        bob_ticket,
        uploads_root,
    })
}

fn session_cookie(response: &Response) -> Result<String> {
    let value = response
        .headers()
        .get(header::SET_COOKIE)
        .context("missing set-cookie")?
        .to_str()?;
    Ok(value
        .split(';')
        .next()
        .context("empty set-cookie")?
        .to_string())
}

async fn login(client: &Client, base: &str, email: &str, password: &str) -> Result<String> {
    let response = client
        .post(format!("{base}/v1/auth/login"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK, "login {email}");
    session_cookie(&response)
}

async fn download(client: &Client, base: &str, cookie: &str, path: &str) -> Result<Response> {
    Ok(client
        .get(format!("{base}/v1/attachments"))
        .query(&[("path", path)])
        .header(header::COOKIE, cookie)
        .send()
        .await?)
}

#[tokio::test]
async fn legacy_login_is_migrated() -> Result<()> {
    let server = spawn_server().await?;
    let client = Client::new();

    login(&client, &server.base, "ALICE@example.com", "alice-pass1").await?;
    assert_eq!(
        server
            .credentials
            .get_password_representation("alice@example.com")
            .await?,
        Some(hash_secret("alice-pass1"))
    );

    // The digest now verifies; the old plaintext compare path is gone.
    login(&client, &server.base, "alice@example.com", "alice-pass1").await?;
    assert_eq!(server.credentials.password_writes(), 1);
    Ok(())
}

#[tokio::test]
async fn owners_and_technicians_see_different_tickets() -> Result<()> {
    let server = spawn_server().await?;
    let client = Client::new();

    let response = client
        .get(format!("{}/v1/tickets", server.base))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let alice = login(&client, &server.base, "alice@example.com", "alice-pass1").await?;
    let tickets: Vec<Value> = client
        .get(format!("{}/v1/tickets", server.base))
        .header(header::COOKIE, &alice)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["id"], json!(server.alice_ticket));

    let response = client
        .get(format!("{}/v1/tickets/{}", server.base, server.bob_ticket))
        .header(header::COOKIE, &alice)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(format!("{}/v1/tickets/9999", server.base))
        .header(header::COOKIE, &alice)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let tech = login(&client, &server.base, "tech@example.com", "tech-pass1").await?;
    let tickets: Vec<Value> = client
        .get(format!("{}/v1/tickets", server.base))
        .header(header::COOKIE, &tech)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tickets.len(), 2);
    Ok(())
}

#[tokio::test]
async fn only_technicians_respond() -> Result<()> {
    let server = spawn_server().await?;
    let client = Client::new();
    let url = format!("{}/v1/tickets/{}/response", server.base, server.alice_ticket);

    let alice = login(&client, &server.base, "alice@example.com", "alice-pass1").await?;
    let response = client
        .post(&url)
        .header(header::COOKIE, &alice)
        .json(&json!({"response": "fixed it myself"}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let tech = login(&client, &server.base, "tech@example.com", "tech-pass1").await?;
    let ticket: Value = client
        .post(&url)
        .header(header::COOKIE, &tech)
        .json(&json!({"response": "Replaced the fuser"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ticket["status"], json!("Respondido"));
    assert_eq!(ticket["technician_response"], json!("Replaced the fuser"));

    // The owner sees the answer.
    let ticket: Value = client
        .get(format!("{}/v1/tickets/{}", server.base, server.alice_ticket))
        .header(header::COOKIE, &alice)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ticket["status"], json!("Respondido"));
    Ok(())
}

#[tokio::test]
async fn session_email_owns_new_tickets() -> Result<()> {
    let server = spawn_server().await?;
    let client = Client::new();

    let bob = login(&client, &server.base, "bob@example.com", "bob-pass1").await?;
    let response = client
        .post(format!("{}/v1/tickets", server.base))
        .header(header::COOKIE, &bob)
        .json(&json!({
            "requester_name": "Bob",
            "email": "alice@example.com",
            "description": "Need a new keyboard"
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let ticket: Value = response.json().await?;
    assert_eq!(ticket["email"], json!("bob@example.com"));
    assert_eq!(ticket["status"], json!("Aberto"));

    let response = client
        .post(format!("{}/v1/tickets", server.base))
        .json(&json!({
            "requester_name": "Walk-in",
            "email": "not-an-email",
            "description": "Monitor flickers"
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn attachment_downloads_follow_ownership() -> Result<()> {
    let server = spawn_server().await?;
    let client = Client::new();
    let alice = login(&client, &server.base, "alice@example.com", "alice-pass1").await?;

    let response = download(&client, &server.base, &alice, "uploads/alice.txt").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(response.bytes().await?.as_ref(), b"alice's log");

    let response = download(&client, &server.base, &alice, "/uploads/bob.pdf").await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Ownership is matched on the exact file name.
    let response = download(&client, &server.base, &alice, "/uploads/ALICE.txt").await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    for path in ["/uploads/../secret.txt", "secret.txt", "/uploads/", ""] {
        let response = download(&client, &server.base, &alice, path).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path:?}");
    }

    let tech = login(&client, &server.base, "tech@example.com", "tech-pass1").await?;
    let response = download(&client, &server.base, &tech, "\\UPLOADS\\bob.pdf").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/pdf")
    );

    let response = download(&client, &server.base, &tech, "/uploads/missing.png").await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn health_reports_store_state() -> Result<()> {
    let server = spawn_server().await?;
    let client = Client::new();

    let response = client.get(format!("{}/health", server.base)).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await?;
    assert_eq!(body["database"], json!("ok"));

    server.credentials.set_fail_reads(true);
    let response = client.get(format!("{}/health", server.base)).send().await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}
