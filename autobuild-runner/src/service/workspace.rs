//! Workspace manager
//!
//! Creates the disposable build tree under the run root. The runner never
//! changes its own working directory; later steps receive the workspace path
//! explicitly.

use std::fs::DirBuilder;
use std::path::Path;

use crate::audit::AuditLog;
use crate::context::RunContext;
use crate::error::{BuildError, Result};

/// Mode of the workspace directory (subject to the process umask)
#[cfg(unix)]
const WORKSPACE_MODE: u32 = 0o777;

#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceManager;

impl WorkspaceManager {
    /// Creates the workspace recorded in the run context and checks it is usable
    ///
    /// A pre-existing workspace is reused as is; callers are expected to
    /// supply a fresh run root per invocation.
    pub fn prepare(&self, ctx: &RunContext, log: &mut AuditLog) -> Result<()> {
        let workspace = &ctx.workspace;

        log.info(format!("Create Directory [{}]", workspace.display()));
        if let Err(source) = create_dir(workspace) {
            log.error(format!(
                "Fail Create Directory [{}]: {}",
                workspace.display(),
                source
            ));
            return Err(BuildError::WorkspaceCreate {
                path: workspace.clone(),
                source,
            });
        }

        log.info(format!("Build Directory [{}]", workspace.display()));
        if !is_accessible_dir(workspace) {
            log.error(format!("Fail Enter Directory [{}]", workspace.display()));
            return Err(BuildError::WorkspaceAccess {
                path: workspace.clone(),
            });
        }

        Ok(())
    }
}

fn create_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(WORKSPACE_MODE);
    }

    builder.create(path)
}

/// Whether the path is a directory whose entries can be listed
pub(crate) fn is_accessible_dir(path: &Path) -> bool {
    path.is_dir() && std::fs::read_dir(path).is_ok()
}
