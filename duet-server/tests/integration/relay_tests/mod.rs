mod test_relay_handles_messages;
mod test_relay_routing;
