//! Login, registration, logout and profile pages.

use std::io::BufRead;

use bakery_client::models::{ProfileUpdate, Registration, User};
use bakery_client::{ApiError, Route, Storefront};
use bakery_core::Email;
use clap::{Args, Subcommand};
use secrecy::SecretString;

use crate::error::CliError;
use crate::views;

/// Password variable for `login` and `register`.
pub const PASSWORD_ENV: &str = "BAKERY_PASSWORD";

/// Where a password comes from.
///
/// There is no `--password` flag: arguments show up in process listings.
#[derive(Args, Debug, Default)]
pub struct PasswordArgs {
    /// Read the password from the first line of stdin instead of the
    /// environment variable
    #[arg(long)]
    pub password_stdin: bool,
}

impl PasswordArgs {
    /// The password from stdin or from `var`.
    ///
    /// # Errors
    ///
    /// `Input` when neither source has a password, `Io` if stdin fails.
    pub fn resolve(&self, var: &str) -> Result<SecretString, CliError> {
        if self.password_stdin {
            return password_from(std::io::stdin().lock());
        }
        match std::env::var(var) {
            Ok(password) if !password.is_empty() => Ok(SecretString::from(password)),
            _ => Err(CliError::Input(format!(
                "No password: set {var} or pass --password-stdin"
            ))),
        }
    }
}

/// First line of `reader`, without the line ending.
fn password_from(mut reader: impl BufRead) -> Result<SecretString, CliError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::Input("Empty password on stdin".to_string()));
    }
    Ok(SecretString::from(password.to_string()))
}

#[derive(Args)]
pub struct LoginArgs {
    pub username: String,
    #[command(flatten)]
    pub password: PasswordArgs,
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[command(flatten)]
    pub password: PasswordArgs,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
}

#[derive(Subcommand, Default)]
pub enum ProfileAction {
    /// Show your profile
    #[default]
    Show,
    /// Change profile fields
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
}

/// Attach the user to error reports.
fn report_as(user: Option<&User>) {
    let sentry_user = user.map(|user| sentry::User {
        id: Some(user.id.to_string()),
        username: Some(user.username.clone()),
        ..Default::default()
    });
    sentry::configure_scope(|scope| scope.set_user(sentry_user));
}

pub async fn login(app: &Storefront, args: LoginArgs) -> Result<String, CliError> {
    let password = args.password.resolve(PASSWORD_ENV)?;
    let user = app.session().login(&args.username, &password).await?;
    report_as(Some(&user));
    app.navigator().navigate(Route::Catalog);
    Ok(views::welcome(&user))
}

pub async fn register(app: &Storefront, args: RegisterArgs) -> Result<String, CliError> {
    let registration = Registration {
        username: args.username,
        email: Email::parse(&args.email).map_err(ApiError::from)?,
        password: args.password.resolve(PASSWORD_ENV)?,
        first_name: args.first_name,
        last_name: args.last_name,
        user_role: None,
    };
    let user = app.session().register(&registration).await?;
    report_as(Some(&user));
    app.navigator().navigate(Route::Catalog);
    Ok(views::welcome(&user))
}

pub async fn logout(app: &Storefront) -> Result<String, CliError> {
    let result = app.session().logout().await;
    report_as(None);
    result?;
    Ok(views::logged_out())
}

pub async fn profile(app: &Storefront, action: ProfileAction) -> Result<String, CliError> {
    match action {
        ProfileAction::Show => {
            let user = app.session().user().ok_or(ApiError::NotAuthenticated)?;
            Ok(views::profile(&user))
        }
        ProfileAction::Update {
            email,
            first_name,
            last_name,
        } => {
            let changes = ProfileUpdate {
                email: email
                    .as_deref()
                    .map(Email::parse)
                    .transpose()
                    .map_err(ApiError::from)?,
                first_name,
                last_name,
            };
            if changes.is_empty() {
                return Err(CliError::Input(
                    "Nothing to change: pass --email, --first-name or --last-name".to_string(),
                ));
            }
            let user = app.session().update_profile(&changes).await?;
            Ok(views::profile(&user))
        }
    }
}
