//! Folder management CLI commands.

use clap::{Args, Subcommand};

use assethub_core::result::AppResult;
use assethub_core::types::{BackendId, FolderId};
use assethub_service::AssetService;

use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Show the folder tree of one or more backends
    Tree {
        /// Backend IDs (all configured backends when omitted)
        #[arg(short, long)]
        backend_id: Vec<BackendId>,
        /// Show only the subtree rooted at this folder
        #[arg(long, conflicts_with = "backend_id")]
        folder_id: Option<FolderId>,
    },
    /// Create a folder
    Create {
        /// Parent folder ID
        #[arg(short, long)]
        parent_id: FolderId,
        /// Folder name
        #[arg(short, long)]
        name: String,
    },
    /// Rename a folder
    Rename {
        /// Folder ID
        folder_id: FolderId,
        /// New name
        name: String,
    },
    /// Move a folder under another folder of the same backend
    Move {
        /// Folder ID
        folder_id: FolderId,
        /// New parent folder ID
        parent_id: FolderId,
        /// Merge into an existing folder of the same name
        #[arg(long)]
        merge: bool,
    },
    /// Delete a folder with its files and subfolders
    Delete {
        /// Folder ID
        folder_id: FolderId,
    },
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    service: &AssetService,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        FolderCommand::Tree {
            backend_id,
            folder_id,
        } => {
            let tree = match folder_id {
                Some(id) => service.get_folder_tree_by_folder_id(*id).await?,
                None if backend_id.is_empty() => {
                    let ids = service.registry().ids();
                    service.get_folder_tree_by_backend_ids(&ids).await?
                }
                None => service.get_folder_tree_by_backend_ids(backend_id).await?,
            };
            output::print_item(&tree.to_nodes(), format);
            Ok(())
        }
        FolderCommand::Create { parent_id, name } => {
            let result = service.create_folder(*parent_id, name).await;
            output::print_result(&result, format)
        }
        FolderCommand::Rename { folder_id, name } => {
            let result = service.rename_folder(*folder_id, name).await;
            output::print_result(&result, format)
        }
        FolderCommand::Move {
            folder_id,
            parent_id,
            merge,
        } => {
            let result = service.move_folder(*folder_id, *parent_id, *merge).await;
            output::print_result(&result, format)
        }
        FolderCommand::Delete { folder_id } => {
            let result = service.delete_folder(*folder_id).await;
            output::print_result(&result, format)
        }
    }
}
