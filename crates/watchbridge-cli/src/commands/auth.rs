use std::time::{Duration, Instant};

use color_eyre::Result;
use owo_colors::OwoColorize;
use tracing::debug;
use watchbridge_config::CredentialStore;
use watchbridge_remote::simkl::{create_auth_client, poll_pin, request_pin, PinPoll};
use watchbridge_remote::RemoteService;

use crate::commands::AppContext;
use crate::output::Output;

pub async fn run_auth(output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let client = create_auth_client();
    let client_id = &ctx.config.simkl.client_id;

    let pin = request_pin(&client, client_id)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Could not request device PIN: {}", e))?;

    output.info(format!(
        "Go to {} and enter the code: {}",
        pin.verification_url.underline(),
        pin.user_code.bold()
    ));
    output.info("Waiting for authorization...");

    let deadline = Instant::now() + Duration::from_secs(pin.expires_in);
    let interval = Duration::from_secs(pin.interval);

    let access_token = loop {
        if Instant::now() >= deadline {
            output.error("The device PIN expired before it was entered.");
            return Err(color_eyre::eyre::eyre!("device PIN expired"));
        }
        tokio::time::sleep(interval).await;

        match poll_pin(&client, client_id, &pin.user_code).await {
            Ok(PinPoll::Granted { access_token }) => break access_token,
            Ok(PinPoll::Pending) => debug!("PIN not entered yet"),
            Err(e) => debug!(error = %e, "PIN poll failed, retrying"),
        }
    };

    let mut store = CredentialStore::new(ctx.paths.credentials_file());
    store.load().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    store.set_access_token(access_token);
    store.save().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    // Pick up the fresh token, then stash the account name for status output.
    ctx.simkl.refresh_token().await;
    match ctx.simkl.user_settings().await {
        Ok(user) => {
            if let Some(name) = user.name {
                let mut store = CredentialStore::new(ctx.paths.credentials_file());
                store.load().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
                store.set_username(name.clone());
                store.save().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
                output.success(format!("Authenticated as {}", name.bold()));
            } else {
                output.success("Authenticated with Simkl");
            }
        }
        Err(e) => {
            output.warn(format!("Token stored, but the account check failed: {}", e));
        }
    }

    Ok(())
}
