mod mock_fetcher;
mod test_http;
