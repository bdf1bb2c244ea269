//! CLI command handlers for the notification daemon and its clients.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use oshirase::config::Config;
use oshirase::error::DaemonError;
use oshirase::notify::dbus::{BUS_NAME, INTERFACE, OBJECT_PATH};
use zbus::zvariant::Value;

use super::CommandResult;
use crate::cli::UrgencyArg;

/// Run the notification daemon.
pub async fn daemon(config_path: Option<&Path>, verbose: bool) -> CommandResult {
    let directive = if verbose { "oshirase=debug" } else { "oshirase=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    let config = Config::load_or_default(config_path)?;

    match oshirase::notify::daemon::run(config).await {
        Err(e @ DaemonError::NameTaken(_)) => {
            // Nothing else to fall back to
            eprintln!("oshirase: {e}");
            std::process::exit(1);
        }
        other => Ok(other?),
    }
}

/// Helper to create a D-Bus proxy for the notification daemon.
async fn notify_proxy() -> Result<zbus::Proxy<'static>, Box<dyn std::error::Error>> {
    let conn = zbus::Connection::session().await?;
    let proxy = zbus::Proxy::new_owned(conn, BUS_NAME, OBJECT_PATH, INTERFACE).await?;
    Ok(proxy)
}

/// Split `KEY=LABEL` pairs into the flat action list. A bare `KEY` is its own label.
pub fn parse_actions(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| match arg.split_once('=') {
            Some((key, label)) => [key.to_string(), label.to_string()],
            None => [arg.clone(), arg.clone()],
        })
        .collect()
}

/// Post a notification via D-Bus.
#[allow(clippy::too_many_arguments)]
pub async fn send(
    app_name: &str,
    replaces: u32,
    icon: &str,
    summary: &str,
    body: &str,
    action_args: &[String],
    urgency: Option<UrgencyArg>,
    image: Option<&PathBuf>,
    timeout: i32,
) -> CommandResult {
    let actions = parse_actions(action_args);

    let mut hints: HashMap<&str, Value> = HashMap::new();
    if let Some(urgency) = urgency {
        hints.insert("urgency", Value::from(urgency.as_byte()));
    }
    if let Some(image) = image {
        let path = std::fs::canonicalize(image)?;
        hints.insert("image-path", Value::from(path.display().to_string()));
    }

    let proxy = notify_proxy().await?;
    let reply = proxy
        .call_method(
            "Notify",
            &(app_name, replaces, icon, summary, body, actions, hints, timeout),
        )
        .await?;
    let id: u32 = reply.body().deserialize()?;

    println!("{id}");
    Ok(())
}

/// Close a notification via D-Bus.
pub async fn close(id: u32) -> CommandResult {
    let proxy = notify_proxy().await?;
    proxy.call_method("CloseNotification", &(id,)).await?;
    println!("Closed notification {id}.");
    Ok(())
}

/// Print server information.
pub async fn info() -> CommandResult {
    let proxy = notify_proxy().await?;
    let reply = proxy.call_method("GetServerInformation", &()).await?;
    let (name, vendor, version, spec_version): (String, String, String, String) =
        reply.body().deserialize()?;

    println!("Name:          {name}");
    println!("Vendor:        {vendor}");
    println!("Version:       {version}");
    println!("Spec version:  {spec_version}");
    Ok(())
}

/// Print advertised capabilities.
pub async fn capabilities() -> CommandResult {
    let proxy = notify_proxy().await?;
    let reply = proxy.call_method("GetCapabilities", &()).await?;
    let caps: Vec<String> = reply.body().deserialize()?;

    if caps.is_empty() {
        println!("No capabilities advertised.");
    }
    for cap in &caps {
        println!("{cap}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        let args = vec!["open=Open mail".to_string(), "snooze".to_string()];
        assert_eq!(
            parse_actions(&args),
            vec!["open", "Open mail", "snooze", "snooze"]
        );
    }
}
