mod test_audio_toggle_broadcast;
mod test_missing_target_dropped;
