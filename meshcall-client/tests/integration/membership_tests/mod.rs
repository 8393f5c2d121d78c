mod test_duplicate_join_is_noop;
mod test_latecomer_learns_roster;
mod test_self_echo_filtered;
