use staffcall::application::{CallServices, ScreenPhase};
use staffcall::config::Config;
use staffcall::domain::call::{CallTarget, TransportEngine};
use staffcall::domain::meeting::{MeetingRecord, MeetingStatus};
use staffcall::domain::navigation::Navigator;
use staffcall::domain::shared::{CallId, DepartmentId, MeetingId};
use staffcall::domain::user::Actor;
use staffcall::infrastructure::persistence::InMemoryBackend;
use staffcall::infrastructure::transport::LoopbackTransport;
use staffcall::interface::{CallScreenKind, RouteNavigator, RouteParams};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting StaffCall");
    info!("Configuration loaded: {:?}", config);

    demo_call_lifecycle(&config).await?;

    info!("StaffCall demo finished");
    Ok(())
}

/// Host and participant share a call bound to a meeting; the host leaves and
/// ends it for everyone
async fn demo_call_lifecycle(config: &Config) -> anyhow::Result<()> {
    info!("=== Call Lifecycle Demo ===");

    let backend = InMemoryBackend::new();
    let transport = LoopbackTransport::new();
    let engine: Arc<dyn TransportEngine> = Arc::new(transport.clone());
    let navigator: Arc<dyn Navigator> = Arc::new(RouteNavigator::logging(config.routes.clone()));

    let host = Actor::new(7, "Ana");
    let guest = Actor::new(9, "Cy");
    let meeting_id = MeetingId::new("m1");

    backend
        .insert_meeting(MeetingRecord::new(
            meeting_id.clone(),
            host.id,
            MeetingStatus::Scheduled,
        ))
        .await;
    backend
        .set_default_call(
            guest.id,
            CallTarget::department(CallId::new("dept-3"), DepartmentId::new(3), "Sales"),
        )
        .await;

    let services_for = |actor: &Actor| {
        let scoped = Arc::new(backend.signed_in_as(actor));
        CallServices {
            meetings: scoped.clone(),
            directory: scoped.clone(),
            credentials: scoped,
            engine: engine.clone(),
            navigator: navigator.clone(),
        }
    };
    let params = RouteParams {
        call_id: Some("room-42".to_string()),
        meeting_id: Some(meeting_id.to_string()),
    };

    let host_screen = CallScreenKind::Generic.mount(services_for(&host), &params, host.clone());
    let guest_screen = CallScreenKind::Generic.mount(services_for(&guest), &params, guest.clone());

    let host_session = host_screen.initialize().await?;
    info!("{} joined as {}", host.display_name, host_session.role);
    let guest_session = guest_screen.initialize().await?;
    info!("{} joined as {}", guest.display_name, guest_session.role);
    info!(
        "{} members in call {}",
        transport.member_count(&host_session.target.call_id),
        host_session.target.call_id
    );

    let report = host_screen.exit().await;
    info!("Host teardown: {:?}", report);

    // The participant's screen reacts to the remote end on its own
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while guest_screen.phase() != ScreenPhase::Closed {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if closed.is_err() {
        warn!("Participant screen did not observe the end of the call");
    }

    let report = guest_screen.dispose().await;
    info!("Participant teardown: {:?}", report);
    host_screen.dispose().await;

    if let Some(record) = backend.meeting(&meeting_id).await {
        info!("Meeting {} is now {}", record.id, record.status.as_str());
    }
    info!("Connected clients left: {}", transport.connected_clients());

    info!("=== Call Lifecycle Demo Complete ===");
    Ok(())
}
