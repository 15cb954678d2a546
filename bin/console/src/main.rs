//! Headless console client for the building-management backend.
//!
//! Wires the session store, role resolver, and route guard over the REST
//! identity provider and backend client, and exposes them as commands.
//! Local state (the persisted session and the role-cache fallback) lives
//! in small JSON files configured via [`config::ConsoleConfig`].

mod config;
mod session;

use config::ConsoleConfig;
use hillcrest_access::{
    FileRoleCache, RoleResolution, RoleResolver, SessionState, SessionStore,
};
use hillcrest_api::{ApiClient, UserUpsert};
use hillcrest_idp::{CallbackParams, GoogleSignInFlow, RestIdentityProvider};
use hillcrest_routing::{
    MenuEntry, RouteGuard, dashboard_redirect, menu_for, requirement_for,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

const USAGE: &str = "\
usage: hillcrest-console <command>

commands:
  register <name> <email> <password>   create an account
  login <email> <password>             sign in with email and password
  login-google                         sign in through Google OAuth
  logout                               sign out and revoke the session
  whoami                               show the signed-in identity and role
  apartments [page]                    list apartment listings
  menu                                 show the dashboard menu for your role
  guard <path>                         show what the route guard decides
  announcements                        list announcements
";

struct App {
    config: ConsoleConfig,
    store: Arc<SessionStore>,
    resolver: Arc<RoleResolver>,
    guard: RouteGuard,
    api: Arc<ApiClient>,
}

impl App {
    fn build(config: ConsoleConfig) -> Self {
        let provider = Arc::new(RestIdentityProvider::new(config.idp.clone()));
        let role_cache = Arc::new(FileRoleCache::new(config.state.role_cache_path.clone()));
        let store = Arc::new(SessionStore::new(provider, role_cache.clone()));
        let api = Arc::new(ApiClient::new(config.api_base_url.clone()));
        let resolver = Arc::new(RoleResolver::new(
            store.clone(),
            api.clone(),
            role_cache,
        ));
        let guard = RouteGuard::new(store.clone(), resolver.clone());
        Self {
            config,
            store,
            resolver,
            guard,
            api,
        }
    }

    /// Settles the persisted session, if any.
    async fn restore(&self) {
        let persisted = session::load(&self.config.state.session_path);
        self.store.restore(persisted).await;
    }

    /// Persists the live session for the next run.
    async fn persist_session(&self) {
        match self.store.refresh_token().await {
            Some(token) => {
                if let Err(err) = session::save(&self.config.state.session_path, &token) {
                    eprintln!("warning: could not persist session: {err}");
                }
            }
            None => session::clear(&self.config.state.session_path),
        }
    }

    async fn bearer(&self) -> String {
        match self.store.get_token(false).await {
            Ok(token) => token,
            Err(err) => exit_with(&format!("not signed in: {err}")),
        }
    }
}

fn exit_with(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,hillcrest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprint!("{USAGE}");
        std::process::exit(2);
    };

    let config = ConsoleConfig::from_env().expect("failed to load configuration");
    let app = App::build(config);

    match command {
        "register" => match &args[1..] {
            [name, email, password] => cmd_register(&app, name, email, password).await,
            _ => exit_with("usage: register <name> <email> <password>"),
        },
        "login" => match &args[1..] {
            [email, password] => cmd_login(&app, email, password).await,
            _ => exit_with("usage: login <email> <password>"),
        },
        "login-google" => cmd_login_google(&app).await,
        "logout" => cmd_logout(&app).await,
        "whoami" => cmd_whoami(&app).await,
        "apartments" => {
            let page = args.get(1).and_then(|raw| raw.parse().ok());
            cmd_apartments(&app, page).await;
        }
        "menu" => cmd_menu(&app).await,
        "guard" => match &args[1..] {
            [path] => cmd_guard(&app, path).await,
            _ => exit_with("usage: guard <path>"),
        },
        "announcements" => cmd_announcements(&app).await,
        other => {
            eprintln!("unknown command: {other}");
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    }
}

async fn cmd_register(app: &App, name: &str, email: &str, password: &str) {
    let identity = match app.store.sign_up(email, password).await {
        Ok(identity) => identity,
        Err(err) => exit_with(&format!("registration failed: {err}")),
    };

    let upsert = UserUpsert::registration(name.to_string(), email.to_string(), String::new());
    let bearer = app.bearer().await;
    if let Err(err) = app.api.upsert_user(&bearer, &upsert).await {
        exit_with(&format!("account created but profile save failed: {err}"));
    }

    app.persist_session().await;
    println!("registered {} ({})", name, identity.email());
}

async fn cmd_login(app: &App, email: &str, password: &str) {
    match app.store.sign_in(email, password).await {
        Ok(identity) => {
            app.persist_session().await;
            println!("signed in as {}", identity.email());
        }
        Err(err) => exit_with(&format!("sign-in failed: {err}")),
    }
}

async fn cmd_login_google(app: &App) {
    let Some(google) = app.config.idp.google() else {
        exit_with("Google sign-in is not configured (set IDP__GOOGLE__* variables)");
    };
    let flow = match GoogleSignInFlow::new(google.clone()) {
        Ok(flow) => flow,
        Err(err) => exit_with(&format!("Google sign-in unavailable: {err}")),
    };

    let (authorize_url, pending) = flow.begin();
    println!("Open this URL in a browser and authorize:");
    println!("  {authorize_url}");
    print!("Paste the full redirect URL here: ");
    std::io::stdout().flush().expect("flush stdout");

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .expect("read stdin");
    let redirect = match Url::parse(line.trim()) {
        Ok(url) => url,
        Err(err) => exit_with(&format!("that is not a URL: {err}")),
    };

    let credential = match flow.complete(CallbackParams::from_url(&redirect), pending).await {
        Ok(credential) => credential,
        Err(err) => exit_with(&format!("Google sign-in failed: {err}")),
    };

    match app.store.sign_in_with_google(&credential).await {
        Ok(identity) => {
            app.persist_session().await;
            println!("signed in as {}", identity.email());
        }
        Err(err) => exit_with(&format!("sign-in failed: {err}")),
    }
}

async fn cmd_logout(app: &App) {
    app.restore().await;
    app.store.sign_out().await;
    session::clear(&app.config.state.session_path);
    println!("signed out");
}

async fn cmd_whoami(app: &App) {
    app.restore().await;
    match app.store.state() {
        SessionState::SignedIn(identity) => {
            let resolution = app.resolver.resolve().await;
            let role = match resolution {
                RoleResolution::Fresh(role) => format!("{role}"),
                RoleResolution::Stale(role) => format!("{role} (cached)"),
                RoleResolution::Unresolved => "unknown".to_string(),
            };
            println!("{} ({role})", identity.email());
            if let Some(name) = identity.display_name() {
                println!("  name: {name}");
            }
        }
        SessionState::SignedOut => println!("not signed in"),
        SessionState::Resolving => println!("session still restoring"),
    }
}

async fn cmd_apartments(app: &App, page: Option<u32>) {
    let listings = match app.api.apartments(page, None, None, None).await {
        Ok(page) => page,
        Err(err) => exit_with(&format!("could not load listings: {err}")),
    };
    for apartment in &listings.apartments {
        println!(
            "{}  block {} floor {}  rent {}",
            apartment.number, apartment.block, apartment.floor, apartment.rent
        );
    }
    println!(
        "({} listings, {} pages)",
        listings.apartments.len(),
        listings.total_pages
    );
}

async fn cmd_menu(app: &App) {
    app.restore().await;
    let resolution = app.resolver.resolve().await;
    let Some(role) = resolution.role() else {
        exit_with("not signed in");
    };

    if let Some(target) = dashboard_redirect("/dashboard", role) {
        println!("landing: {target}");
    }
    for entry in menu_for(role) {
        match entry {
            MenuEntry::Link { path, label } => println!("  {label}  ->  {path}"),
            MenuEntry::SignOut => println!("  Logout"),
        }
    }
}

async fn cmd_guard(app: &App, path: &str) {
    app.restore().await;
    let Some(requirement) = requirement_for(path) else {
        println!("{path}: public");
        return;
    };
    let decision = app.guard.decide(path, requirement).await;
    println!("{path}: {decision:?}");
}

async fn cmd_announcements(app: &App) {
    app.restore().await;
    let bearer = app.bearer().await;
    let announcements = match app.api.announcements(&bearer).await {
        Ok(list) => list,
        Err(err) => exit_with(&format!("could not load announcements: {err}")),
    };
    if announcements.is_empty() {
        println!("no announcements");
    }
    for announcement in announcements {
        println!("# {}", announcement.title);
        println!("{}", announcement.description);
    }
}
