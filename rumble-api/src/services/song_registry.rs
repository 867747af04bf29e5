//! Song registry
//!
//! Maps an opaque song identifier to the metadata of its uploaded file.
//! Entries are read-only after registration.

use chrono::{DateTime, Utc};
use rumble_common::api::SongDetails;
use std::path::PathBuf;
use tracing::info;

use crate::store::MemoryStore;

/// Uploaded-file metadata, minus the registration timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewSong {
    pub originalname: String,
    pub mimetype: String,
    pub size: u64,
    pub file_path: PathBuf,
}

/// Registered song
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub originalname: String,
    pub mimetype: String,
    pub size: u64,
    /// Location of the uploaded audio on local disk
    pub file_path: PathBuf,
    pub uploaded_at: DateTime<Utc>,
}

impl Song {
    /// Public projection (excludes the storage path)
    pub fn details(&self, id: &str) -> SongDetails {
        SongDetails {
            id: id.to_string(),
            originalname: self.originalname.clone(),
            mimetype: self.mimetype.clone(),
            size: self.size,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(Clone, Default)]
pub struct SongRegistry {
    songs: MemoryStore<Song>,
}

impl SongRegistry {
    pub fn new(songs: MemoryStore<Song>) -> Self {
        Self { songs }
    }

    /// Register a song under a fresh UUIDv4 and return the identifier
    pub async fn add_song(&self, song: NewSong) -> String {
        let song_id = rumble_common::uuid_utils::generate();
        let NewSong {
            originalname,
            mimetype,
            size,
            file_path,
        } = song;

        self.songs
            .insert(
                song_id.clone(),
                Song {
                    originalname,
                    mimetype,
                    size,
                    file_path,
                    uploaded_at: rumble_common::time::now(),
                },
            )
            .await;

        info!(song_id = %song_id, "Added song");
        song_id
    }

    pub async fn get_song(&self, song_id: &str) -> Option<Song> {
        self.songs.get(song_id).await
    }

    /// Remove a song; `true` if an entry existed
    pub async fn delete_song(&self, song_id: &str) -> bool {
        self.songs.remove(song_id).await.is_some()
    }
}
