//! Administrative command line surface. Everything here runs against the
//! store directly and prints its progress to stdout; the web server is not
//! involved.

use clap::{Parser, Subcommand};

use crate::database::{self, MovieDb, UserDb};
use crate::model::{Movie, User};

#[derive(Parser)]
#[command(name = "watchlist", version, about = "Personal movie watchlist")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize the database
    Initdb {
        /// Drop existing data first
        #[arg(long)]
        drop: bool,
    },
    /// Seed the database with sample movies
    Forge,
    /// Create or update the admin account
    Admin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

const SAMPLE_MOVIES: &[(&str, &str)] = &[
    ("My Neighbor Totoro", "1988"),
    ("Dead Poets Society", "1989"),
    ("A Perfect World", "1993"),
    ("Leon", "1994"),
    ("Mahjong", "1996"),
    ("Swallowtail Butterfly", "1996"),
    ("King of Comedy", "1999"),
    ("Devils on the Doorstep", "1999"),
    ("WALL-E", "2008"),
    ("The Pork of Music", "2012"),
];

pub fn run(command: Command, db: &sled::Db) -> anyhow::Result<()> {
    match command {
        Command::Initdb { drop } => {
            // Opening the database already created the trees; only a
            // requested drop has work to do.
            if drop {
                database::drop_all(db)?;
            }
            println!("Initialized database.");
        }
        Command::Forge => {
            // Seed a placeholder account alongside the sample data so the
            // page title has a name. No credentials: the empty username can
            // never match a login form, which insists on non-empty fields;
            // the `admin` command sets real ones. An existing account is
            // left alone.
            if db.get_user()?.is_none() {
                db.put_user(&User {
                    name: "Grey Li".to_owned(),
                    username: String::new(),
                    password_hash: String::new(),
                })?;
            }
            for (title, year) in SAMPLE_MOVIES {
                db.add_movie(&Movie {
                    title: (*title).to_owned(),
                    year: (*year).to_owned(),
                })?;
            }
            println!("Done.");
        }
        Command::Admin { username, password } => {
            let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
            let user = match db.get_user()? {
                Some(mut user) => {
                    println!("Updating user...");
                    user.username = username;
                    user.password_hash = password_hash;
                    user
                }
                None => {
                    println!("Creating user...");
                    User {
                        name: "Admin".to_owned(),
                        username,
                        password_hash,
                    }
                }
            };
            db.put_user(&user)?;
            println!("Done.");
        }
    }
    Ok(())
}
