//! The Session State Machine and its supporting pieces.
//!
//! This module is organized into several sub-modules:
//!
//! - **`manager`** - The [`CallSessionManager`] owning the single active
//!   session and the idempotent teardown path
//! - **`calls`** - User operations (initiate, accept, decline, hangup) and
//!   call history access
//! - **`handlers`** - Inbound signaling dispatch, media event pump, and the
//!   ring/timeout supervisor entry point
//! - **`controls`** - Mute, camera toggle, and the video device switcher
//! - **`config`** / **`builder`** - Configuration and adapter wiring
//!
//! # Basic call flow
//!
//! ```rust,no_run
//! # use peercall_core::{SessionBuilder, SessionEvent, CallState, MediaKind};
//! # use peercall_core::signaling::SignalingChannel;
//! # use peercall_core::media::MediaEngine;
//! # use std::sync::Arc;
//! # async fn example(
//! #     signaling: Arc<dyn SignalingChannel>,
//! #     engine: Arc<dyn MediaEngine>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! // 1. Wire the adapters and build one manager per local participant
//! let session = SessionBuilder::new()
//!     .local_user("alice")
//!     .signaling(signaling)
//!     .media_engine(engine)
//!     .build()?;
//!
//! // 2. Subscribe to UI events
//! let mut events = session.subscribe_events();
//!
//! // 3. Place a call
//! let call_id = session.initiate("bob", MediaKind::AudioVideo).await?;
//!
//! // 4. Track it to completion
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             SessionEvent::StateChanged { new_state: CallState::Connected, .. } => {
//!                 println!("call connected");
//!             }
//!             SessionEvent::CallEnded { entry, .. } => {
//!                 println!("call ended: {:?}", entry.outcome);
//!                 break;
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! // 5. Hang up when done
//! session.hangup().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod calls;
pub mod config;
pub mod controls;
pub mod handlers;
pub mod manager;

pub use builder::SessionBuilder;
pub use config::SessionConfig;
pub use manager::CallSessionManager;
