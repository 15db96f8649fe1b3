mod commands;
mod database;
mod flash;
mod model;
mod validate;

use actix_identity::{CookieIdentityPolicy, Identity, IdentityService};
use actix_web::http::StatusCode;
use actix_web::{error, middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer};
use clap::Parser;
use database::*;
use flash::Flash;
use log::debug;
use model::*;
use serde::{Deserialize, Serialize};

use commands::Cli;

type Tera = web::Data<tera::Tera>;
type Db = web::Data<sled::Db>;

fn log_error<E: std::fmt::Debug>(err: E, message: &'static str) -> error::Error {
    debug!("{:?}", err);
    error::ErrorInternalServerError(message)
}

/// The one authentication rule: the identity cookie must name the stored
/// account. A stale identity (the account was renamed by the `admin`
/// command since login) counts as unauthenticated.
fn session_matches(id: &Identity, user: Option<&User>) -> bool {
    match (id.identity(), user) {
        (Some(username), Some(user)) => username == user.username,
        _ => false,
    }
}

fn is_authenticated(id: &Identity, db: &sled::Db) -> sled::Result<bool> {
    Ok(session_matches(id, db.get_user()?.as_ref()))
}

/// Context shared by every page: the stored account (the page title uses
/// its display name whether or not anyone is logged in) and whether the
/// current session is authenticated.
fn base_context(id: &Identity, db: &sled::Db) -> sled::Result<(tera::Context, bool)> {
    let user = db.get_user()?;
    let logged_in = session_matches(id, user.as_ref());
    let mut ctx = tera::Context::new();
    ctx.insert("user", &user);
    ctx.insert("logged_in", &logged_in);
    Ok((ctx, logged_in))
}

/// Renders a page, surfacing a pending flash message exactly once.
fn render_page(
    tera: &tera::Tera,
    req: &HttpRequest,
    name: &str,
    ctx: &mut tera::Context,
    status: StatusCode,
) -> actix_web::Result<HttpResponse> {
    let pending = flash::peek(req);
    ctx.insert("flash", &pending.map(Flash::message));
    let body = tera
        .render(name, ctx)
        .map_err(|err| log_error(err, "Template error"))?;
    let mut builder = HttpResponse::build(status);
    builder.content_type("text/html; charset=utf-8");
    if pending.is_some() {
        builder.del_cookie(&flash::clear());
    }
    Ok(builder.body(body))
}

#[derive(Serialize)]
struct MovieEntry {
    id: u64,
    title: String,
    year: String,
}

impl MovieEntry {
    fn new((id, movie): (u64, Movie)) -> MovieEntry {
        MovieEntry {
            id,
            title: movie.title,
            year: movie.year,
        }
    }
}

#[derive(Deserialize)]
struct MovieParams {
    title: String,
    year: String,
}

#[derive(Deserialize)]
struct LoginParams {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct SettingsParams {
    name: String,
}

async fn index(
    req: HttpRequest,
    id: Identity,
    tera: Tera,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let (mut ctx, _) = base_context(&id, &db).map_err(|err| log_error(err, "Database error"))?;
    let movies = db
        .list_movies()
        .map_err(|err| log_error(err, "Database error"))?
        .into_iter()
        .map(MovieEntry::new)
        .collect::<Vec<_>>();
    ctx.insert("movies", &movies);
    render_page(&tera, &req, "index.html", &mut ctx, StatusCode::OK)
}

async fn create(
    params: web::Form<MovieParams>,
    id: Identity,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    if !is_authenticated(&id, &db).map_err(|err| log_error(err, "Database error"))? {
        // The listing itself is public, so bounce back to it instead of the
        // login page.
        return Ok(flash::redirect_silent("/"));
    }
    let params = params.into_inner();
    if !validate::movie_input(&params.title, &params.year) {
        return Ok(flash::redirect("/", Flash::InvalidInput));
    }
    db.add_movie(&Movie {
        title: params.title,
        year: params.year,
    })
    .map_err(|err| log_error(err, "Database error"))?;
    Ok(flash::redirect("/", Flash::ItemCreated))
}

async fn edit(
    req: HttpRequest,
    path: web::Path<u64>,
    id: Identity,
    tera: Tera,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let movie_id = path.into_inner();
    let (mut ctx, logged_in) =
        base_context(&id, &db).map_err(|err| log_error(err, "Database error"))?;
    if !logged_in {
        return Ok(flash::redirect_silent("/login"));
    }
    match db
        .get_movie(movie_id)
        .map_err(|err| log_error(err, "Database error"))?
    {
        Some(movie) => {
            ctx.insert("movie", &MovieEntry::new((movie_id, movie)));
            render_page(&tera, &req, "edit.html", &mut ctx, StatusCode::OK)
        }
        None => render_page(&tera, &req, "404.html", &mut ctx, StatusCode::NOT_FOUND),
    }
}

async fn update(
    req: HttpRequest,
    path: web::Path<u64>,
    params: web::Form<MovieParams>,
    id: Identity,
    tera: Tera,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let movie_id = path.into_inner();
    let (mut ctx, logged_in) =
        base_context(&id, &db).map_err(|err| log_error(err, "Database error"))?;
    if !logged_in {
        return Ok(flash::redirect_silent("/login"));
    }
    if db
        .get_movie(movie_id)
        .map_err(|err| log_error(err, "Database error"))?
        .is_none()
    {
        return render_page(&tera, &req, "404.html", &mut ctx, StatusCode::NOT_FOUND);
    }
    let params = params.into_inner();
    if !validate::movie_input(&params.title, &params.year) {
        return Ok(flash::redirect("/", Flash::InvalidInput));
    }
    db.update_movie(
        movie_id,
        &Movie {
            title: params.title,
            year: params.year,
        },
    )
    .map_err(|err| log_error(err, "Database error"))?;
    Ok(flash::redirect("/", Flash::ItemUpdated))
}

async fn delete(
    req: HttpRequest,
    path: web::Path<u64>,
    id: Identity,
    tera: Tera,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let movie_id = path.into_inner();
    let (mut ctx, logged_in) =
        base_context(&id, &db).map_err(|err| log_error(err, "Database error"))?;
    if !logged_in {
        return Ok(flash::redirect_silent("/login"));
    }
    if !db
        .delete_movie(movie_id)
        .map_err(|err| log_error(err, "Database error"))?
    {
        return render_page(&tera, &req, "404.html", &mut ctx, StatusCode::NOT_FOUND);
    }
    Ok(flash::redirect("/", Flash::ItemDeleted))
}

async fn login(
    req: HttpRequest,
    id: Identity,
    tera: Tera,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let (mut ctx, _) = base_context(&id, &db).map_err(|err| log_error(err, "Database error"))?;
    render_page(&tera, &req, "login.html", &mut ctx, StatusCode::OK)
}

async fn login_post(
    params: web::Form<LoginParams>,
    id: Identity,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let params = params.into_inner();
    if !validate::login_input(&params.username, &params.password) {
        return Ok(flash::redirect("/login", Flash::InvalidInput));
    }
    if let Some(user) = db
        .get_user()
        .map_err(|err| log_error(err, "Database error"))?
    {
        if params.username == user.username
            && bcrypt::verify(&params.password, &user.password_hash)
                .map_err(|err| log_error(err, "Verification error"))?
        {
            id.remember(user.username);
            return Ok(flash::redirect("/", Flash::LoginSuccess));
        }
    }
    Ok(flash::redirect("/login", Flash::BadCredentials))
}

async fn logout(id: Identity, db: Db) -> actix_web::Result<HttpResponse> {
    if !is_authenticated(&id, &db).map_err(|err| log_error(err, "Database error"))? {
        return Ok(flash::redirect_silent("/login"));
    }
    id.forget();
    Ok(flash::redirect("/", Flash::Goodbye))
}

async fn settings(
    req: HttpRequest,
    id: Identity,
    tera: Tera,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let (mut ctx, logged_in) =
        base_context(&id, &db).map_err(|err| log_error(err, "Database error"))?;
    if !logged_in {
        return Ok(flash::redirect_silent("/login"));
    }
    render_page(&tera, &req, "settings.html", &mut ctx, StatusCode::OK)
}

async fn settings_post(
    params: web::Form<SettingsParams>,
    id: Identity,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    if !is_authenticated(&id, &db).map_err(|err| log_error(err, "Database error"))? {
        return Ok(flash::redirect_silent("/login"));
    }
    let params = params.into_inner();
    if !validate::name_input(&params.name) {
        return Ok(flash::redirect("/settings", Flash::InvalidInput));
    }
    let mut user = db
        .get_user()
        .map_err(|err| log_error(err, "Database error"))?
        .ok_or_else(|| log_error("user record disappeared", "Authentication error"))?;
    user.name = params.name;
    db.put_user(&user)
        .map_err(|err| log_error(err, "Database error"))?;
    Ok(flash::redirect("/", Flash::SettingsUpdated))
}

async fn not_found(
    req: HttpRequest,
    id: Identity,
    tera: Tera,
    db: Db,
) -> actix_web::Result<HttpResponse> {
    let (mut ctx, _) = base_context(&id, &db).map_err(|err| log_error(err, "Database error"))?;
    render_page(&tera, &req, "404.html", &mut ctx, StatusCode::NOT_FOUND)
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/", web::post().to(create))
        .route("/movie/edit/{id}", web::get().to(edit))
        .route("/movie/edit/{id}", web::post().to(update))
        .route("/movie/delete/{id}", web::post().to(delete))
        .route("/login", web::get().to(login))
        .route("/login", web::post().to(login_post))
        .route("/logout", web::get().to(logout))
        .route("/settings", web::get().to(settings))
        .route("/settings", web::post().to(settings_post));
}

fn identity_service(key: &[u8; 32]) -> IdentityService<CookieIdentityPolicy> {
    IdentityService::new(
        CookieIdentityPolicy::new(key)
            .name("auth-cookie")
            .secure(false),
    )
}

/// Stretches the configured secret to cookie-key length.
fn session_key(secret: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    for (slot, byte) in key.iter_mut().zip(secret.bytes().cycle()) {
        *slot = byte;
    }
    key
}

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "watchlist=debug,actix_web=info");
    }
    env_logger::init();

    let cli = Cli::parse();
    let database_file =
        std::env::var("DATABASE_FILE").unwrap_or_else(|_| "data.db".to_owned());
    let db = sled::open(&database_file)?;

    if let Some(command) = cli.command {
        return commands::run(command, &db);
    }

    let secret = std::env::var("SECRET_KEY").unwrap_or_else(|_| "dev".to_owned());
    let key = session_key(&secret);

    HttpServer::new(move || {
        let tera = tera::Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*")).unwrap();
        App::new()
            .wrap(Logger::default())
            .wrap(identity_service(&key))
            .data(tera)
            .data(db.clone())
            .configure(routes)
            .default_service(web::route().to(not_found))
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await?;
    Ok(())
}
