//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Integration tests for `ServerConfig`

use muxnet_core::ServerConfig;
use std::time::Duration;

#[test]
fn test_server_config_defaults() {
    let config = ServerConfig::default();

    assert!(config.bind_addresses.is_empty());
    assert!(config.tls_bind_addresses.is_empty());
    assert_eq!(config.max_connections, 0);
    assert_eq!(config.idle_timeout, Duration::from_secs(3600));
    assert_eq!(config.read_timeout, Duration::from_secs(300));
    assert_eq!(config.write_timeout, Duration::from_secs(30));
    assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    assert_eq!(config.output_cap_bytes, 1024 * 1024);
    assert!(config.helper_resolver_path.is_none());
    assert!(config.helper_stub_path.is_none());
}

#[test]
fn test_server_config_builder() {
    let plain: std::net::SocketAddr = "127.0.0.1:4201".parse().unwrap();
    let tls: std::net::SocketAddr = "127.0.0.1:4202".parse().unwrap();

    let config = ServerConfig::new()
        .with_bind_address(plain)
        .with_tls_bind_address(tls)
        .with_max_connections(500)
        .with_idle_timeout(Duration::from_secs(120))
        .with_read_timeout(Duration::from_secs(60))
        .with_write_timeout(Duration::from_secs(15))
        .with_shutdown_timeout(Duration::from_secs(2))
        .with_output_cap_bytes(4096)
        .with_helper_resolver_path("/usr/local/bin/resolver")
        .with_helper_stub_path("/usr/local/bin/stub");

    assert_eq!(config.bind_addresses, vec![plain]);
    assert_eq!(config.tls_bind_addresses, vec![tls]);
    assert_eq!(config.max_connections, 500);
    assert_eq!(config.idle_timeout, Duration::from_secs(120));
    assert_eq!(config.read_timeout, Duration::from_secs(60));
    assert_eq!(config.write_timeout, Duration::from_secs(15));
    assert_eq!(config.shutdown_timeout, Duration::from_secs(2));
    assert_eq!(config.output_cap_bytes, 4096);
    assert_eq!(
        config.helper_resolver_path.as_deref(),
        Some(std::path::Path::new("/usr/local/bin/resolver"))
    );
    assert_eq!(
        config.helper_stub_path.as_deref(),
        Some(std::path::Path::new("/usr/local/bin/stub"))
    );
}

#[test]
fn test_all_bind_addresses_chains_plain_and_tls() {
    let plain: std::net::SocketAddr = "127.0.0.1:4201".parse().unwrap();
    let tls: std::net::SocketAddr = "127.0.0.1:4202".parse().unwrap();

    let config = ServerConfig::new()
        .with_bind_address(plain)
        .with_tls_bind_address(tls);

    let all: Vec<_> = config.all_bind_addresses().copied().collect();
    assert_eq!(all, vec![plain, tls]);
}

#[test]
fn test_server_config_clone() {
    let config1 = ServerConfig::new().with_max_connections(100);
    let config2 = config1.clone();

    assert_eq!(config1.max_connections, config2.max_connections);
}

#[test]
fn test_multiple_bind_addresses_accumulate() {
    let a: std::net::SocketAddr = "127.0.0.1:4201".parse().unwrap();
    let b: std::net::SocketAddr = "127.0.0.1:4202".parse().unwrap();

    let config = ServerConfig::new().with_bind_address(a).with_bind_address(b);

    assert_eq!(config.bind_addresses, vec![a, b]);
}
