mod test_join_leave_restores_count;
