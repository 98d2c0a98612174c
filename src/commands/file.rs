//! File management CLI commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::{AssetId, FolderId};
use assethub_entity::ConflictResolution;
use assethub_service::{AssetService, MoveRequest};

use crate::output::{self, OutputFormat};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Store a local file in a folder
    Insert {
        /// Local file to read
        path: PathBuf,
        /// Destination folder ID
        #[arg(short = 'd', long)]
        folder_id: FolderId,
        /// Stored filename (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Decision when the filename is taken: replace, cancel, keepBoth
        #[arg(long)]
        on_conflict: Option<ConflictResolution>,
    },
    /// Move files into another folder, possibly of another backend
    Move {
        /// File IDs
        #[arg(required = true)]
        file_ids: Vec<AssetId>,
        /// Destination folder ID
        #[arg(short = 'd', long)]
        dest_folder_id: FolderId,
        /// New filename (single file only)
        #[arg(short, long)]
        rename: Option<String>,
        /// Decision applied to every conflicting file
        #[arg(long)]
        on_conflict: Option<ConflictResolution>,
    },
    /// Delete files
    Delete {
        /// File IDs
        #[arg(required = true)]
        file_ids: Vec<AssetId>,
        /// Only remove the index rows, keep the stored bytes
        #[arg(long)]
        keep_bytes: bool,
    },
    /// Print the public URL of a file
    Url {
        /// File ID
        file_id: AssetId,
        /// Transform name
        #[arg(short, long)]
        transform: Option<String>,
    },
}

/// Execute file commands
pub async fn execute(args: &FileArgs, service: &AssetService, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        FileCommand::Insert {
            path,
            folder_id,
            name,
            on_conflict,
        } => {
            let filename = match name {
                Some(name) => name.clone(),
                None => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| AppError::validation("The local path has no file name"))?,
            };
            let result = service
                .insert_file_by_local_path(path, &filename, *folder_id, *on_conflict)
                .await;
            output::print_result(&result, format)
        }
        FileCommand::Move {
            file_ids,
            dest_folder_id,
            rename,
            on_conflict,
        } => {
            let mut request = MoveRequest::new(file_ids.clone(), *dest_folder_id)
                .actions(vec![*on_conflict; file_ids.len()]);
            if let Some(name) = rename {
                request = request.rename(name.clone());
            }
            let result = service.move_files(&request).await;
            output::print_result(&result, format)
        }
        FileCommand::Delete {
            file_ids,
            keep_bytes,
        } => {
            let result = service.delete_files(file_ids, !keep_bytes).await;
            output::print_result(&result, format)
        }
        FileCommand::Url {
            file_id,
            transform,
        } => {
            let asset = service
                .get_file_by_id(*file_id)
                .await?
                .ok_or_else(|| AppError::not_found("Can’t find the file!"))?;
            match service.get_url_for_file(&asset, transform.as_deref()).await? {
                Some(url) => println!("{url}"),
                None => println!("No public URL"),
            }
            Ok(())
        }
    }
}
