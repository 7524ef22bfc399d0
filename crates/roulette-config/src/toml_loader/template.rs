/// Default TOML config content with comments.
pub(super) fn default_config_toml() -> &'static str {
    r##"# Roulette Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[matching]
# http_url = "http://localhost:8000"     # POST /registerForMatching
# ws_url = "ws://localhost:8000"         # /ws/{name} is appended
# connect_timeout_secs = 15              # 1-120
# request_timeout_secs = 10              # 1-120

[signaling]
# ws_url = "ws://localhost:4000"         # /ws/{name} is appended
# connect_timeout_secs = 15              # 1-120

[media]
# audio = true
# video = true

[peer]
# trickle = true
# ice_servers = ["stun:stun.l.google.com:19302"]

[logging]
# level = "info"                         # trace, debug, info, warn, error
"##
}
