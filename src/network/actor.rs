//! Network actor - runs backend calls in the Tokio async runtime

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::network::{Mutation, Query};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::ApiClient;

/// Network actor that turns commands into backend calls
pub struct NetworkActor {
    client: ApiClient,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(client: ApiClient, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            client,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Shutdown) | None => {
                            self.active_requests.abort_all();
                            break;
                        }
                        Some(cmd) => self.spawn(cmd),
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }

    fn spawn(&mut self, cmd: NetworkCommand) {
        let client = self.client.clone();
        let response_tx = self.response_tx.clone();

        self.active_requests.spawn(async move {
            if let Some(response) = execute(&client, cmd).await {
                let _ = response_tx.send(response);
            }
        });
    }
}

/// Run one command to completion
pub async fn execute(client: &ApiClient, cmd: NetworkCommand) -> Option<NetworkResponse> {
    let response = match cmd {
        NetworkCommand::Login {
            epoch,
            identifier,
            password,
        } => {
            tracing::info!(epoch, "logging in");
            NetworkResponse::LoggedIn {
                epoch,
                result: client.login(&identifier, &password).await,
            }
        }

        NetworkCommand::Register {
            epoch,
            username,
            email,
            password,
        } => {
            tracing::info!(epoch, %username, "registering");
            NetworkResponse::Registered {
                epoch,
                result: client.register(&username, &email, &password).await,
            }
        }

        NetworkCommand::Fetch { epoch, query } => {
            tracing::debug!(epoch, ?query, "fetching");
            fetch(client, epoch, query).await
        }

        NetworkCommand::Mutate { epoch, mutation } => {
            tracing::info!(epoch, ?mutation, "mutating");
            let result = match &mutation {
                Mutation::SubmitPrompt(draft) => client.submit_prompt(draft.clone()).await,
                Mutation::CancelItem(id) => client.cancel_item(id).await,
                Mutation::RemoveItem(id) => client.remove_item(id).await,
                Mutation::ClearQueue(user_id) | Mutation::Logout(user_id) => {
                    client.clear_queue(user_id).await
                }
                Mutation::DeleteUser(id) => client.delete_user(id).await,
                Mutation::DeleteImage(id) => client.delete_image(id).await,
            };
            NetworkResponse::Mutated {
                epoch,
                mutation,
                result,
            }
        }

        NetworkCommand::Shutdown => return None,
    };

    Some(response)
}

async fn fetch(client: &ApiClient, epoch: u64, query: Query) -> NetworkResponse {
    match query {
        Query::Users => NetworkResponse::UsersLoaded {
            epoch,
            result: client.users().await,
        },
        Query::UserInfo(id) => NetworkResponse::UserInfoLoaded {
            epoch,
            result: client.user_info(&id).await,
        },
        Query::UserImages(id) => NetworkResponse::ImagesLoaded {
            epoch,
            result: client.user_images(&id).await,
        },
        Query::UserDetails(id) => {
            let result = client.user_details(&id).await;
            NetworkResponse::UserDetailsLoaded {
                epoch,
                user_id: id,
                result,
            }
        }
        Query::Queue(id) => NetworkResponse::QueueLoaded {
            epoch,
            result: client.user_queue(&id).await,
        },
        Query::Progress(ids) => NetworkResponse::ProgressLoaded {
            epoch,
            samples: client.progress_for(ids).await,
        },
    }
}
