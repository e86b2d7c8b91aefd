use crate::room::participant_connection::{ConnectionId, ParticipantConnection};
use crate::room::room_command::RoomCommand;
use crate::room::room_manager::RoomManager;
use huddle_core::{ParticipantId, RoomId, SignalMessage};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Room actor. Owns the participant map of one room; every mutation and
/// broadcast for the room runs on this task, so membership is never observed
/// half-updated.
pub struct Room {
    room_id: RoomId,
    generation: u64,
    participants: HashMap<ParticipantId, ParticipantConnection>,
    command_rx: mpsc::Receiver<RoomCommand>,
    manager: RoomManager,
}

impl Room {
    pub(crate) fn new(
        room_id: RoomId,
        generation: u64,
        command_rx: mpsc::Receiver<RoomCommand>,
        manager: RoomManager,
    ) -> Self {
        Self {
            room_id,
            generation,
            participants: HashMap::new(),
            command_rx,
            manager,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.room_id, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            let shrank = self.handle_command(cmd);

            if shrank && self.participants.is_empty() {
                info!(room = %self.room_id, "Room is empty. Shutting down room.");
                break;
            }
        }

        let room_id = self.room_id.clone();
        self.retire().await;
        info!(room = %room_id, "Room event loop finished");
    }

    /// Returns `true` when a participant was removed.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                participant_id,
                connection,
            } => {
                self.join(participant_id, connection);
                false
            }

            RoomCommand::Signal {
                participant_id,
                connection_id,
                message,
            } => {
                if !self.is_current(&participant_id, connection_id) {
                    debug!(
                        room = %self.room_id,
                        participant = %participant_id,
                        kind = message.kind(),
                        "Dropping message from a connection that is no longer registered"
                    );
                    return false;
                }
                self.route(participant_id, message)
            }

            RoomCommand::Disconnect {
                participant_id,
                connection_id,
            } => {
                if !self.is_current(&participant_id, connection_id) {
                    debug!(
                        room = %self.room_id,
                        participant = %participant_id,
                        "Ignoring close of a replaced connection"
                    );
                    return false;
                }
                info!(room = %self.room_id, participant = %participant_id, "Connection closed");
                self.remove_with_notify(&participant_id)
            }

            RoomCommand::Inspect { reply } => {
                let _ = reply.send(self.participants.keys().cloned().collect());
                false
            }
        }
    }

    fn join(&mut self, participant_id: ParticipantId, connection: ParticipantConnection) {
        if let Some(previous) = self.participants.insert(participant_id.clone(), connection) {
            info!(
                room = %self.room_id,
                participant = %participant_id,
                previous_connection = previous.id(),
                "Re-join replaced existing connection"
            );
        } else {
            info!(room = %self.room_id, participant = %participant_id, "Participant joined");
        }

        let others: Vec<ParticipantId> = self
            .participants
            .keys()
            .filter(|id| **id != participant_id)
            .cloned()
            .collect();

        self.send_to(
            &participant_id,
            SignalMessage::Participants {
                participants: others,
            },
        );

        self.broadcast_except(
            &participant_id,
            SignalMessage::ParticipantJoined {
                from: participant_id.clone(),
            },
        );
    }

    fn route(&mut self, sender: ParticipantId, message: SignalMessage) -> bool {
        match message {
            SignalMessage::Offer { ref to, .. }
            | SignalMessage::Answer { ref to, .. }
            | SignalMessage::IceCandidate { ref to, .. }
            | SignalMessage::Mute { ref to, .. } => {
                let to = to.clone();
                self.send_to(&to, message);
                false
            }

            SignalMessage::Kick { from, to } => {
                let Some(target) = self.participants.get(&to) else {
                    debug!(room = %self.room_id, target = %to, "Kick target not in room");
                    return false;
                };
                info!(room = %self.room_id, kicker = %from, target = %to, "Participant kicked");
                target.send(SignalMessage::Kicked { from });
                self.remove_with_notify(&to)
            }

            SignalMessage::AudioToggle { .. } => {
                self.broadcast_except(&sender, message);
                false
            }

            SignalMessage::Leave { .. } => {
                info!(room = %self.room_id, participant = %sender, "Participant left");
                self.remove_with_notify(&sender)
            }

            other => {
                warn!(
                    room = %self.room_id,
                    participant = %sender,
                    kind = other.kind(),
                    "Message type is not routable"
                );
                false
            }
        }
    }

    fn is_current(&self, participant_id: &ParticipantId, connection_id: ConnectionId) -> bool {
        self.participants
            .get(participant_id)
            .is_some_and(|c| c.id() == connection_id)
    }

    fn remove_with_notify(&mut self, participant_id: &ParticipantId) -> bool {
        if self.participants.remove(participant_id).is_none() {
            return false;
        }

        self.broadcast_except(
            participant_id,
            SignalMessage::ParticipantLeft {
                from: participant_id.clone(),
            },
        );
        true
    }

    /// Undeliverable messages are dropped: the target may have legitimately left.
    fn send_to(&self, participant_id: &ParticipantId, message: SignalMessage) {
        match self.participants.get(participant_id) {
            Some(connection) if connection.send(message) => {}
            _ => debug!(
                room = %self.room_id,
                target = %participant_id,
                "Target absent or not writable, message dropped"
            ),
        }
    }

    fn broadcast_except(&self, excluded: &ParticipantId, message: SignalMessage) {
        for (id, connection) in &self.participants {
            if id == excluded {
                continue;
            }
            if !connection.send(message.clone()) {
                debug!(room = %self.room_id, target = %id, "Skipping non-writable participant");
            }
        }
    }

    /// Unregisters the room and hands any command that raced in after the
    /// last participant left back to the manager, which starts a fresh room.
    async fn retire(mut self) {
        self.manager.forget(&self.room_id, self.generation);
        self.command_rx.close();

        while let Some(cmd) = self.command_rx.recv().await {
            debug!(room = %self.room_id, "Re-dispatching command received during shutdown");
            self.manager.dispatch(&self.room_id, cmd).await;
        }
    }
}
