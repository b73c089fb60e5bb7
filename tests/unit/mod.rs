mod sequencer_tests;
mod validation_tests;
