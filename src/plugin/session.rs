//! Session manager.
//!
//! One compiler session per build. The handle is shared by every handler
//! of the build; closing is idempotent and also attempted when the last
//! handle drops without an explicit close.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compiler::{
    CompilerExtension, CompilerOptions, CompilerSession, IdentifierMode, StyleCompiler,
};
use crate::error::{Error, Result};
use crate::host::InitialOptions;

/// Shared handle to the build's compiler session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

struct Inner {
    session: Arc<dyn CompilerSession>,
    root: PathBuf,
    identifiers: IdentifierMode,
    closed: AtomicBool,
}

impl SessionHandle {
    /// Open a session for a build.
    ///
    /// The root is the build's working directory, else the process cwd.
    /// `identifiers` overrides the mode derived from `minify`.
    pub fn open(
        compiler: &dyn StyleCompiler,
        initial: &InitialOptions,
        identifiers: Option<IdentifierMode>,
        extensions: Vec<Arc<dyn CompilerExtension>>,
    ) -> Result<Self> {
        let root = initial.working_root();
        let identifiers = IdentifierMode::select(identifiers, initial.minify);
        let session = compiler.open(CompilerOptions {
            root: root.clone(),
            identifiers,
            extensions,
        })?;

        crate::debug!(
            "session";
            "opened at {} (identifiers: {})",
            root.display(),
            identifiers.as_str()
        );
        Ok(Self {
            inner: Arc::new(Inner {
                session,
                root,
                identifiers,
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn identifiers(&self) -> IdentifierMode {
        self.inner.identifiers
    }

    /// The live session, or `SessionClosed` after disposal.
    pub fn get(&self) -> Result<&Arc<dyn CompilerSession>> {
        if self.is_closed() {
            Err(Error::SessionClosed)
        } else {
            Ok(&self.inner.session)
        }
    }

    /// Close the session. Only the first call reaches the compiler.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        crate::debug!("session"; "closing");
        self.inner.session.close().await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // best effort: only possible from inside a runtime
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let closing = self.session.close();
            runtime.spawn(async move {
                if let Err(e) = closing.await {
                    crate::log!("error"; "session close on drop failed: {}", e);
                }
            });
        }
    }
}
