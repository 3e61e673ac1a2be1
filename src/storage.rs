use crate::errors::AppError;
use crate::models::AppData;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{error, info};

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<AppData>(&bytes) {
            Ok(data) => {
                info!(
                    users = data.users.len(),
                    tweets = data.tweets.len(),
                    "loaded board from {}",
                    path.display()
                );
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(|err| {
        error!("failed to write data file {}: {err}", path.display());
        AppError::internal(err)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("tweet_board_storage_{}_{tag}.json", std::process::id()));
        path
    }

    #[tokio::test]
    async fn missing_file_loads_empty_board() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.users.is_empty());
        assert_eq!(data.next_tweet_id, 0);
    }

    #[tokio::test]
    async fn persisted_board_loads_back() {
        let path = temp_path("persist");
        let mut data = AppData::default();
        data.insert_tweet("alice", "hello");
        persist_data(&path, &data).await.unwrap();

        let loaded = load_data(&path).await;
        assert_eq!(loaded.next_tweet_id, 1);
        assert_eq!(loaded.tweets[&1].content, "hello");
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty_board() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"{not json").unwrap();
        let data = load_data(&path).await;
        assert!(data.tweets.is_empty());
        let _ = std::fs::remove_file(path);
    }
}
