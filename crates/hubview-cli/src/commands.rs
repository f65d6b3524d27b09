//! Subcommand implementations.

use anyhow::{Context, Result};
use hubview_core::controllers::{UserDetailField, UserDetailState, UserListField, UserListState};
use hubview_core::{GitHubViewer, Repository, StateChange, User};
use serde_json::json;
use std::fmt::Debug;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Output options shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub watch: bool,
}

/// Print each state change to stderr until the controller is dropped.
fn watch<S, F>(
    mut changes: UnboundedReceiver<StateChange<S, F>>,
    describe: fn(&S, F) -> String,
) -> JoinHandle<()>
where
    S: Send + 'static,
    F: Copy + Debug + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(change) = changes.recv().await {
            eprintln!("[{:?}] {}", change.field, describe(&change.state, change.field));
        }
    })
}

fn describe_list(state: &UserListState, field: UserListField) -> String {
    match field {
        UserListField::Users => format!("{} users", state.users.len()),
        UserListField::CurrentPage => format!("next page {}", state.current_page),
        UserListField::HasMore => format!("has more: {}", state.has_more),
        UserListField::IsLoading => format!("loading: {}", state.is_loading),
        UserListField::Error => describe_error(state.error.as_ref()),
    }
}

fn describe_detail(state: &UserDetailState, field: UserDetailField) -> String {
    match field {
        UserDetailField::User => state
            .user
            .as_ref()
            .map(|u| format!("profile of {}", u.login))
            .unwrap_or_else(|| "no profile".to_string()),
        UserDetailField::Repositories => format!("{} repositories", state.repositories.len()),
        UserDetailField::IsLoading => format!("loading: {}", state.is_loading),
        UserDetailField::LoadingUser => format!("loading profile: {}", state.loading_user),
        UserDetailField::LoadingRepositories => {
            format!("loading repositories: {}", state.loading_repositories)
        }
        UserDetailField::Error => describe_error(state.error.as_ref()),
    }
}

fn describe_error(error: Option<&hubview_core::NetworkError>) -> String {
    error
        .map(|e| format!("error: {}", e))
        .unwrap_or_else(|| "error cleared".to_string())
}

/// `hubview users`: load up to `pages` pages and print them.
pub async fn list_users(viewer: &GitHubViewer, pages: u32, output: Output) -> Result<()> {
    let list = viewer.user_list();
    let watcher = output.watch.then(|| watch(list.subscribe(), describe_list));

    for _ in 0..pages {
        list.fetch_users().await;
        let state = list.snapshot();
        if state.error.is_some() || !state.has_more {
            break;
        }
    }

    let state = list.snapshot();
    drop(list);
    if let Some(watcher) = watcher {
        watcher.await?;
    }

    print_users(&state.users, output.json)?;
    info!(
        "{} users loaded, next page {}, more available: {}",
        state.users.len(),
        state.current_page,
        state.has_more
    );

    match state.error {
        Some(err) => Err(anyhow::Error::new(err).context("Failed to load users")),
        None => Ok(()),
    }
}

fn print_users(users: &[User], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(users)?);
        return Ok(());
    }

    for user in users {
        println!("{:>10}  {}", user.id, user.login);
    }
    Ok(())
}

/// `hubview user <login>`: show profile and non-fork repositories.
pub async fn show_user(viewer: &GitHubViewer, login: &str, output: Output) -> Result<()> {
    let detail = viewer.user_detail(login);
    let watcher = output.watch.then(|| watch(detail.subscribe(), describe_detail));

    detail.load().await;

    let state = detail.snapshot();
    drop(detail);
    if let Some(watcher) = watcher {
        watcher.await?;
    }

    if output.json {
        let body = json!({
            "user": state.user,
            "repositories": state.repositories,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_profile(state.user.as_ref(), &state.repositories);
    }

    match state.error {
        Some(err) => Err(anyhow::Error::new(err).context(format!("Failed to load {}", login))),
        None => Ok(()),
    }
}

fn print_profile(user: Option<&User>, repositories: &[Repository]) {
    if let Some(user) = user {
        println!("{} ({})", user.display_name(), user.login);
        if let (Some(followers), Some(following)) = (user.followers, user.following) {
            println!("{} followers, {} following", followers, following);
        }
        println!("{}", user.avatar_url);
        println!();
    }

    if repositories.is_empty() {
        println!("No repositories");
        return;
    }

    for repo in repositories {
        let language = repo.language.as_deref().unwrap_or("-");
        println!("{:>6}*  {}  [{}]", repo.stargazers_count, repo.name, language);
        if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            println!("         {}", description);
        }
    }
}

/// `hubview cache clear`.
pub fn clear_cache(viewer: &GitHubViewer) -> Result<()> {
    viewer.clear_cache().context("Failed to clear cache")?;
    println!("Cache cleared");
    Ok(())
}

/// `hubview cache prune`.
pub fn prune_cache(viewer: &GitHubViewer) -> Result<()> {
    let removed = viewer.prune_cache().context("Failed to prune cache")?;
    if removed == 0 {
        warn!("No expired entries found");
    }
    println!("Removed {} expired entries", removed);
    Ok(())
}
