use super::handlers::{
    auth::{login, recovery, register, session},
    health,
    tickets::{attachment, ticket},
};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add endpoints here via `.routes(routes!(...))` so they are both served and
/// documented. `OPTIONS /health` is added outside and stays undocumented.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(register::register))
        .routes(routes!(login::login))
        .routes(routes!(session::logout))
        .routes(routes!(session::session))
        .routes(routes!(recovery::request_recovery))
        .routes(routes!(recovery::reset_password))
        .routes(routes!(ticket::list_tickets, ticket::create_ticket))
        .routes(routes!(ticket::get_ticket))
        .routes(routes!(ticket::respond_ticket))
        .routes(routes!(ticket::update_status))
        .routes(routes!(attachment::download_attachment))
}

fn api_tags() -> Vec<Tag> {
    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Login, registration, sessions and password recovery".to_string());

    let mut tickets_tag = Tag::new("tickets");
    tickets_tag.description = Some("Support tickets and attachments".to_string());

    vec![auth_tag, tickets_tag]
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).tags(Some(api_tags())).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(';').next().map(str::trim)?;
    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    Some(value.trim()).filter(|trimmed| !trimmed.is_empty())
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(value: &str) -> Option<&str> {
        Some(value.trim()).filter(|v| !v.is_empty())
    }

    match author.split_once('<') {
        Some((name, email)) => (non_empty(name), non_empty(email.trim_end_matches('>'))),
        None => (non_empty(author), None),
    }
}
