//! Read-only advertisement resources
//!
//! Two fixed URIs: a description of the tool surface and the allowed
//! directory listing. Both are pure lookups.

use rmcp::model::{AnnotateAble, RawResource, Resource};

use crate::handlers;
use crate::sandbox::Sandbox;

pub const INTERFACE_URI: &str = "sandbox://interface";
pub const ALLOWED_DIRECTORIES_URI: &str = "sandbox://allowed-directories";

pub const INTERFACE_DESCRIPTION: &str = "\
Sandboxed filesystem server. Every path is resolved against the configured root \
and must fall inside one of the allowed directories.

Tools:
- read_file(path): file content as text
- read_multiple_files(paths): per-path content or error, in request order
- write_file(path, content): create or overwrite, creating parent directories
- edit_file(path, edits[{old_text, new_text}], dry_run): ordered find/replace of every occurrence; dry_run previews
- create_directory(path): recursive; an allowed directory itself is a valid target
- list_directory(path): [DIR]/[FILE] entries
- move_file(source, destination): fails if the destination exists
- search_files(path, pattern, exclude_patterns): case-insensitive glob, dotfiles included
- get_file_info(path): type, size, timestamps, permissions
- list_allowed_directories(): allowed directories relative to the root";

/// Resources advertised by the server.
pub fn list() -> Vec<Resource> {
    let mut interface = RawResource::new(INTERFACE_URI, "interface".to_string());
    interface.description = Some("Description of the available filesystem tools".to_string());
    interface.mime_type = Some("text/plain".to_string());

    let mut allowed = RawResource::new(ALLOWED_DIRECTORIES_URI, "allowed-directories".to_string());
    allowed.description = Some("Directories operations may touch, relative to the root".to_string());
    allowed.mime_type = Some("text/plain".to_string());

    vec![interface.no_annotation(), allowed.no_annotation()]
}

/// Text behind `uri`, or `None` for an unknown URI.
pub fn read(uri: &str, sandbox: &Sandbox) -> Option<String> {
    match uri {
        INTERFACE_URI => Some(INTERFACE_DESCRIPTION.to_string()),
        ALLOWED_DIRECTORIES_URI => Some(handlers::list_allowed_directories(sandbox)),
        _ => None,
    }
}
