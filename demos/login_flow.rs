use std::sync::Arc;
use std::time::Duration;

use gosub_session::cookies::JsonCookieStore;
use gosub_session::{HttpClient, RequestOptions, Session, SessionConfig, SessionError};

// Usage: login_flow <base-url> <user> <password> [cookie-file]
#[tokio::main]
async fn main() -> Result<(), SessionError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(base), Some(user), Some(password)) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: login_flow <base-url> <user> <password> [cookie-file]");
        std::process::exit(2);
    };
    let cookie_file = args.next().unwrap_or_else(|| "session-cookies.json".into());

    // Don't follow redirects, so we can see where the login sends us
    let cfg = SessionConfig::builder()
        .timeout(Duration::from_secs(30))
        .max_redirects(0)
        .build()?;

    // One client for the whole process; every session gets a handle to it
    let client = HttpClient::new(cfg)?;
    let session = Session::new(client, Arc::new(JsonCookieStore::new(cookie_file.into())));

    let login = session
        .post_form(
            &format!("{base}/login"),
            &[("user", user.as_str()), ("password", password.as_str())],
            RequestOptions::new(),
        )
        .await?;

    println!("login: {} (location: {:?})", login.status, login.location());

    // Only trust the cookies when the server accepted us
    if login.is_success() || (login.status == 302 && login.has_new_cookies()) {
        login.save_session().await?;
        println!("session saved: {} cookie(s)", session.cookies_snapshot().await?.len());
    } else {
        println!("login rejected, keeping previous session");
    }

    let page = session.get(&format!("{base}/"), RequestOptions::new()).await?;
    println!("home: {} ({} bytes)", page.status, page.data.len());

    Ok(())
}
