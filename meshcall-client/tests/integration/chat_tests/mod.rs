mod test_chat_hello_between_peers;
