mod cold_start;
mod emergency_stop;
mod long_run_stability;
mod parameter_rejection;
mod pulse_on_empty_tank;
mod slow_subscriber;
