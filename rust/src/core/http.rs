use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::command::{Command, CommandClient, CommandReply, CommandResult};
use crate::contacts::AddressEntry;
use crate::error::CommandError;
use crate::providers::StorageProviderRecord;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// `CommandClient` against the authority's REST API.
#[derive(Clone)]
pub struct HttpCommandClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCommandClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    fn build(&self, command: &Command) -> reqwest::RequestBuilder {
        match command {
            Command::ListFiles { context } => self
                .request(Method::GET, "/api/file/list")
                .query(&context.list_params()),
            Command::ShareFile { file_id, addresses } => self
                .request(Method::POST, &format!("/api/file/share/{file_id}"))
                .json(addresses),
            Command::UnshareFile { file_id, addresses } => self
                .request(Method::POST, &format!("/api/file/revoke/{file_id}"))
                .json(addresses),
            Command::SignFile { file_hash } => {
                self.request(Method::GET, &format!("/api/file/sign/{file_hash}"))
            }
            Command::SendSignRequest { file_id, addresses } => self
                .request(
                    Method::POST,
                    &format!("/api/file/sendSigningRequest/{file_id}"),
                )
                .json(addresses),
            Command::RemoveFile { file_id } => {
                self.request(Method::POST, &format!("/api/file/remove/{file_id}"))
            }
            Command::RemoveFileLocal { file_id } => {
                self.request(Method::POST, &format!("/api/file/removeLocal/{file_id}"))
            }
            Command::UpdateNotification { notification } => self
                .request(Method::PUT, "/api/notification/update")
                .json(notification),
            Command::MarkAllNotificationsRead => {
                self.request(Method::PUT, "/api/notification/markAllAsRead")
            }
            Command::DeleteNotification { id } => {
                self.request(Method::DELETE, &format!("/api/notification/remove/{id}"))
            }
            Command::LoadContacts => self.request(Method::GET, "/api/contacts"),
            Command::AddContact { name, address } => self
                .request(Method::PUT, "/api/contact")
                .json(&json!({ "name": name, "address": address })),
            Command::UpdateContact { address, name } => self
                .request(Method::POST, "/api/contact")
                .json(&json!({ "name": name, "address": address })),
            Command::RemoveContact { address } => {
                self.request(Method::DELETE, &format!("/api/contact/{address}"))
            }
            Command::LoadStorageProviders => self.request(Method::GET, "/api/providers"),
            Command::ApproveXes { xes_value } => self
                .request(Method::POST, "/api/approveXESToContract")
                .json(&json!({ "xesValue": xes_value })),
            Command::Logout => self.request(Method::POST, "/api/logout"),
        }
    }
}

async fn read_reply(command: &Command, resp: reqwest::Response) -> CommandResult {
    let status = resp.status();
    if status == StatusCode::CONFLICT {
        return Err(CommandError::Conflict);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CommandError::Status {
            status: status.as_u16(),
            body,
        });
    }
    match command {
        Command::LoadContacts => {
            let entries: Option<Vec<AddressEntry>> = resp.json().await?;
            Ok(CommandReply::Contacts(entries.unwrap_or_default()))
        }
        Command::LoadStorageProviders => {
            let providers: Option<Vec<StorageProviderRecord>> = resp.json().await?;
            Ok(CommandReply::StorageProviders(providers.unwrap_or_default()))
        }
        _ => Ok(CommandReply::Done),
    }
}

impl CommandClient for HttpCommandClient {
    fn execute(&self, command: Command) -> BoxFuture<'static, CommandResult> {
        let request = self.build(&command);
        async move {
            let resp = request.send().await?;
            let result = read_reply(&command, resp).await;
            if let Err(ref e) = result {
                tracing::debug!(command = command.tag(), %e, "command failed");
            }
            result
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{FileCategory, QueryContext};

    fn client() -> HttpCommandClient {
        HttpCommandClient::new("http://drive.local:8081/")
    }

    #[test]
    fn list_files_carries_the_query_context() {
        let req = client()
            .build(&Command::ListFiles {
                context: QueryContext::new(FileCategory::SharedWithMe, "report"),
            })
            .build()
            .unwrap();
        assert_eq!(*req.method(), Method::GET);
        let url = req.url();
        assert_eq!(url.path(), "/api/file/list");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("filter".to_string(), "report".to_string())));
        assert!(pairs.contains(&("sharedWithMe".to_string(), "true".to_string())));
    }

    #[test]
    fn paths_and_methods() {
        let c = client();
        let cases = [
            (
                Command::ShareFile {
                    file_id: "h1".into(),
                    addresses: vec!["0xa".into()],
                },
                Method::POST,
                "/api/file/share/h1",
            ),
            (
                Command::UnshareFile {
                    file_id: "h1".into(),
                    addresses: vec![],
                },
                Method::POST,
                "/api/file/revoke/h1",
            ),
            (
                Command::SignFile {
                    file_hash: "h2".into(),
                },
                Method::GET,
                "/api/file/sign/h2",
            ),
            (
                Command::DeleteNotification { id: "n1".into() },
                Method::DELETE,
                "/api/notification/remove/n1",
            ),
            (
                Command::AddContact {
                    name: "Bob".into(),
                    address: "0xb".into(),
                },
                Method::PUT,
                "/api/contact",
            ),
            (
                Command::ApproveXes {
                    xes_value: "10".into(),
                },
                Method::POST,
                "/api/approveXESToContract",
            ),
            (Command::Logout, Method::POST, "/api/logout"),
        ];
        for (command, method, path) in cases {
            let req = c.build(&command).build().unwrap();
            assert_eq!(*req.method(), method, "{}", command.tag());
            assert_eq!(req.url().path(), path, "{}", command.tag());
            assert_eq!(req.url().host_str(), Some("drive.local"));
        }
    }
}
