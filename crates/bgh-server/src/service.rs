use bgh_core::BALL_MIN;
use bgh_core::BallNumber;
use bgh_core::RoomId;
use bgh_core::SLOW_CONSUMER_STRIKES;
use bgh_core::Unique;
use bgh_game::BallKind;
use bgh_game::GameError;
use bgh_gameroom::Event;
use bgh_gameroom::Manager;
use bgh_wire::pb;
use bgh_wire::pb::dealer_service_server::DealerService;
use bgh_wire::pb::game_event::Kind;
use chrono::Utc;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::Response;
use tonic::Status;

/// Command ingress: request validation, manager dispatch, and the 1-to-1
/// mapping of domain error codes onto wire statuses.
pub struct DealerGrpc {
    manager: Arc<Manager>,
}

impl DealerGrpc {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }
}

fn status_of(err: GameError) -> Status {
    let code = match &err {
        GameError::GameNotFound => tonic::Code::NotFound,
        GameError::DuplicateBallNumber(_) => tonic::Code::AlreadyExists,
        GameError::SaveGameFailed(_) => tonic::Code::Internal,
        _ => tonic::Code::FailedPrecondition,
    };
    Status::new(code, err.to_string())
}

fn required(field: &str, value: &str) -> Result<(), Status> {
    if value.trim().is_empty() {
        Err(Status::invalid_argument(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

fn ball_number(number: u32, kind: BallKind) -> Result<BallNumber, Status> {
    if number < BALL_MIN as u32 || number > kind.limit() as u32 {
        return Err(Status::invalid_argument(format!(
            "ball number {} outside [{}, {}]",
            number,
            BALL_MIN,
            kind.limit()
        )));
    }
    Ok(number as BallNumber)
}

/// Committed event in wire form, stamped at delivery.
fn wire_event(room: &RoomId, event: Event) -> pb::GameEvent {
    let timestamp = Utc::now().to_rfc3339();
    let (round_id, kind) = match event {
        Event::StageChanged { round, old, new } => (
            round.to_string(),
            Kind::StageChanged(pb::StageChanged {
                old_stage: pb::GameStage::from(old) as i32,
                new_stage: pb::GameStage::from(new) as i32,
            }),
        ),
        Event::BallDrawn { round, ball } => (
            round.to_string(),
            Kind::BallDrawn(pb::BallDrawn {
                ball: Some(pb::Ball::from(&ball)),
            }),
        ),
        Event::GameCreated { game } => (
            game.id().to_string(),
            Kind::GameCreated(pb::GameCreated {
                game: Some(pb::GameSnapshot::from(&game)),
            }),
        ),
        Event::GameCancelled { round, reason, at } => (
            round.to_string(),
            Kind::GameCancelled(pb::GameCancelled {
                reason,
                cancelled_at: at.to_rfc3339(),
            }),
        ),
        Event::GameCompleted { game } => (
            game.id().to_string(),
            Kind::GameCompleted(pb::GameCompleted {
                game: Some(pb::GameSnapshot::from(&game)),
            }),
        ),
        Event::SideSelected { round, side } => (
            round.to_string(),
            Kind::SideSelected(pb::ExtraBallSideSelected {
                side: pb::ExtraBallSide::from(side) as i32,
            }),
        ),
        Event::Notification { game } => (
            game.id().to_string(),
            Kind::Notification(pb::Notification {
                game: Some(pb::GameSnapshot::from(&game)),
            }),
        ),
        Event::Heartbeat => (String::new(), Kind::Heartbeat(pb::Heartbeat {})),
    };
    pb::GameEvent {
        room_id: room.clone(),
        round_id,
        timestamp,
        kind: Some(kind),
    }
}

impl DealerGrpc {
    async fn handle_draw(
        &self,
        kind: BallKind,
        request: Request<pb::DrawBallRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        let number = ball_number(req.number, kind)?;
        let round = self
            .manager
            .draw(&req.room_id, kind, number, req.is_last)
            .await
            .map_err(status_of)?;
        Ok(Response::new(pb::CommandReply::from(&round)))
    }
}

#[tonic::async_trait]
impl DealerService for DealerGrpc {
    async fn start_new_round(
        &self,
        request: Request<pb::RoomRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        let round = self.manager.create(&req.room_id).await.map_err(status_of)?;
        Ok(Response::new(pb::CommandReply::from(&round)))
    }
    async fn advance_stage(
        &self,
        request: Request<pb::AdvanceStageRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        let round = self
            .manager
            .advance(&req.room_id, req.force)
            .await
            .map_err(status_of)?;
        Ok(Response::new(pb::CommandReply::from(&round)))
    }
    async fn get_game_status(
        &self,
        request: Request<pb::RoomRequest>,
    ) -> Result<Response<pb::GameStatusReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        let round = self.manager.current(&req.room_id).await.map_err(status_of)?;
        Ok(Response::new(pb::GameStatusReply {
            game: Some(pb::GameSnapshot::from(&round)),
        }))
    }
    async fn draw_ball(
        &self,
        request: Request<pb::DrawBallRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        self.handle_draw(BallKind::Regular, request).await
    }
    async fn draw_extra_ball(
        &self,
        request: Request<pb::DrawBallRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        self.handle_draw(BallKind::Extra, request).await
    }
    async fn draw_jackpot_ball(
        &self,
        request: Request<pb::DrawBallRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        self.handle_draw(BallKind::Jackpot, request).await
    }
    async fn draw_lucky_ball(
        &self,
        request: Request<pb::DrawBallRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        self.handle_draw(BallKind::Lucky, request).await
    }
    async fn set_has_jackpot(
        &self,
        request: Request<pb::SetHasJackpotRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        let round = self
            .manager
            .set_jackpot(&req.room_id, req.has_jackpot)
            .await
            .map_err(status_of)?;
        Ok(Response::new(pb::CommandReply::from(&round)))
    }
    async fn notify_jackpot_winner(
        &self,
        request: Request<pb::NotifyJackpotWinnerRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        required("winner_id", &req.winner_id)?;
        let round = self
            .manager
            .notify_winner(&req.room_id, &req.winner_id)
            .await
            .map_err(status_of)?;
        Ok(Response::new(pb::CommandReply::from(&round)))
    }
    async fn cancel_game(
        &self,
        request: Request<pb::CancelGameRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        required("reason", &req.reason)?;
        let round = self
            .manager
            .cancel(&req.room_id, &req.reason)
            .await
            .map_err(status_of)?;
        Ok(Response::new(pb::CommandReply::from(&round)))
    }
    async fn start_jackpot_round(
        &self,
        request: Request<pb::RoomRequest>,
    ) -> Result<Response<pb::CommandReply>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        self.manager.create(&req.room_id).await.map_err(status_of)?;
        let round = self
            .manager
            .set_jackpot(&req.room_id, true)
            .await
            .map_err(status_of)?;
        Ok(Response::new(pb::CommandReply::from(&round)))
    }

    type SubscribeGameEventsStream =
        Pin<Box<dyn Stream<Item = Result<pb::GameEvent, Status>> + Send>>;

    async fn subscribe_game_events(
        &self,
        request: Request<pb::SubscribeRequest>,
    ) -> Result<Response<Self::SubscribeGameEventsStream>, Status> {
        let req = request.into_inner();
        required("room_id", &req.room_id)?;
        let subscription = self.manager.subscribe(&req.room_id).await.map_err(status_of)?;
        let hub = Arc::clone(self.manager.hub());
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        tokio::spawn(async move {
            loop {
                match subscription.next().await {
                    Some(event) => {
                        let wire = wire_event(subscription.room(), event);
                        if tx.send(Ok(wire)).await.is_err() {
                            // client went away
                            hub.unsubscribe(&subscription);
                            return;
                        }
                    }
                    None => {
                        if subscription.strikes() >= SLOW_CONSUMER_STRIKES {
                            let _ = tx
                                .send(Err(Status::resource_exhausted("slow consumer")))
                                .await;
                        }
                        hub.unsubscribe(&subscription);
                        return;
                    }
                }
            }
        });
        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgh_cache::LiveStore;
    use bgh_cache::MemoryStore;
    use bgh_gameroom::Fanout;
    use bgh_gameroom::Hub;
    use bgh_gameroom::HubSink;
    use bgh_pg::HistoryStore;
    use bgh_pg::MemoryHistory;

    fn room() -> String {
        "SG01".to_string()
    }
    async fn service() -> DealerGrpc {
        let hub = Arc::new(Hub::new());
        let sinks = Fanout::new().register(Arc::new(HubSink::new(hub.clone())));
        let manager = Arc::new(Manager::new(
            vec![room()],
            Arc::new(MemoryStore::new()) as Arc<dyn LiveStore>,
            Arc::new(MemoryHistory::new()) as Arc<dyn HistoryStore>,
            hub,
            sinks,
        ));
        manager.start().await.expect("boot");
        DealerGrpc::new(manager)
    }

    #[tokio::test]
    async fn rejects_out_of_range_ball_numbers() {
        let service = service().await;
        for number in [0u32, 100, 500] {
            let err = service
                .draw_ball(Request::new(pb::DrawBallRequest {
                    room_id: room(),
                    number,
                    is_last: false,
                }))
                .await
                .unwrap_err();
            assert_eq!(err.code(), tonic::Code::InvalidArgument);
        }
    }
    #[tokio::test]
    async fn rejects_blank_winner_and_reason() {
        let service = service().await;
        let err = service
            .notify_jackpot_winner(Request::new(pb::NotifyJackpotWinnerRequest {
                room_id: room(),
                winner_id: "  ".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
        let err = service
            .cancel_game(Request::new(pb::CancelGameRequest {
                room_id: room(),
                reason: String::new(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }
    #[tokio::test]
    async fn domain_codes_survive_onto_the_wire() {
        let service = service().await;
        // drawing in Preparation violates the phase protocol
        let err = service
            .draw_ball(Request::new(pb::DrawBallRequest {
                room_id: room(),
                number: 7,
                is_last: false,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::FailedPrecondition);
        assert!(err.message().starts_with("INVALID_STAGE_FOR_DRAW"));
        let err = service
            .get_game_status(Request::new(pb::RoomRequest {
                room_id: "SG99".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
        assert!(err.message().starts_with("GAME_NOT_FOUND"));
    }
    #[tokio::test]
    async fn command_reply_echoes_round_and_stage() {
        let service = service().await;
        let reply = service
            .advance_stage(Request::new(pb::AdvanceStageRequest {
                room_id: room(),
                force: false,
            }))
            .await
            .expect("advance")
            .into_inner();
        assert!(!reply.round_id.is_empty());
        assert_eq!(reply.stage, pb::GameStage::NewRound as i32);
    }
    #[tokio::test]
    async fn status_returns_the_full_snapshot() {
        let service = service().await;
        let reply = service
            .get_game_status(Request::new(pb::RoomRequest { room_id: room() }))
            .await
            .expect("status")
            .into_inner();
        let game = reply.game.expect("snapshot");
        assert_eq!(game.room_id, room());
        assert_eq!(game.stage, pb::GameStage::Preparation as i32);
    }
    #[tokio::test]
    async fn start_jackpot_round_enables_the_arc() {
        let service = service().await;
        service
            .start_jackpot_round(Request::new(pb::RoomRequest { room_id: room() }))
            .await
            .expect("start jackpot");
        let reply = service
            .get_game_status(Request::new(pb::RoomRequest { room_id: room() }))
            .await
            .expect("status")
            .into_inner();
        assert!(reply.game.expect("snapshot").has_jackpot);
    }
    #[tokio::test]
    async fn subscription_stream_opens_with_the_snapshot() {
        use tokio_stream::StreamExt;
        let service = service().await;
        let mut stream = service
            .subscribe_game_events(Request::new(pb::SubscribeRequest { room_id: room() }))
            .await
            .expect("subscribe")
            .into_inner();
        let first = stream.next().await.expect("event").expect("ok");
        assert_eq!(first.room_id, room());
        match first.kind {
            Some(Kind::Notification(n)) => {
                assert_eq!(n.game.expect("snapshot").stage, pb::GameStage::Preparation as i32)
            }
            other => panic!("expected notification, got {:?}", other),
        }
    }
}
