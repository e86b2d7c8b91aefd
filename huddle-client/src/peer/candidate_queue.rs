use huddle_core::IceCandidate;
use std::collections::VecDeque;

/// Remote candidates that arrived before the remote description. Applied
/// in arrival order once it is set.
#[derive(Debug, Default)]
pub(crate) struct CandidateQueue {
    candidates: VecDeque<IceCandidate>,
}

impl CandidateQueue {
    pub(crate) fn push(&mut self, candidate: IceCandidate) {
        self.candidates.push_back(candidate);
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }

    pub(crate) fn into_ordered(self) -> impl Iterator<Item = IceCandidate> {
        self.candidates.into_iter()
    }
}
