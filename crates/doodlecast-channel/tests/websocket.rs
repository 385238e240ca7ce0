//! Integration tests for the relay transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! over loopback.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;

    use doodlecast_channel::{
        Channel, ChannelError, Delivery, MessageCallback, RelayConnection,
        RelayListener, WebSocketChannel,
    };
    use doodlecast_protocol::{
        ClientFrame, Codec, JsonCodec, ReplayFrom, ServerFrame, SubscriptionId,
    };
    use futures_util::{SinkExt, StreamExt};
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    async fn listen() -> (RelayListener, String) {
        let listener = RelayListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have an address");
        (listener, addr.to_string())
    }

    async fn connect_raw(
        addr: &str,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    async fn recv_frame(conn: &RelayConnection) -> ClientFrame {
        let data = conn.recv().await.unwrap().expect("client frame");
        JsonCodec.decode(&data).unwrap()
    }

    async fn send_frame(conn: &RelayConnection, frame: &ServerFrame) {
        conn.send(&JsonCodec.encode(frame).unwrap()).await.unwrap();
    }

    // =====================================================================
    // RelayListener / RelayConnection
    // =====================================================================

    #[tokio::test]
    async fn test_accept_and_send_receive() {
        let (listener, addr) = listen().await;
        let server = tokio::spawn(async move {
            listener.accept().await.expect("should accept")
        });

        let mut client = connect_raw(&addr).await;
        let conn = server.await.expect("task should complete");
        assert!(conn.id().into_inner() > 0);

        conn.send(b"hello from relay").await.unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello from relay");

        client
            .send(Message::Binary(b"hello from client".to_vec().into()))
            .await
            .unwrap();
        let received = conn.recv().await.unwrap().expect("should have data");
        assert_eq!(received, b"hello from client");

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (listener, addr) = listen().await;
        let server = tokio::spawn(async move { listener.accept().await.unwrap() });
        let mut client = connect_raw(&addr).await;
        let conn = Arc::new(server.await.unwrap());

        let reader = Arc::clone(&conn);
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::task::yield_now().await;

        conn.send(b"while reading").await.unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"while reading");

        client.send(Message::Close(None)).await.unwrap();
        assert!(pending.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (listener, addr) = listen().await;
        let server = tokio::spawn(async move { listener.accept().await.unwrap() });
        let mut client = connect_raw(&addr).await;
        let conn = server.await.unwrap();

        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    // =====================================================================
    // WebSocketChannel against a scripted relay
    // =====================================================================

    #[tokio::test]
    async fn test_channel_publish_returns_replay_id() {
        let (listener, addr) = listen().await;
        let relay = tokio::spawn(async move {
            let conn = listener.accept().await.unwrap();
            let frame = recv_frame(&conn).await;
            let ClientFrame::Publish {
                request_id,
                topic,
                payload,
            } = frame
            else {
                panic!("expected publish, got {frame:?}");
            };
            assert_eq!(topic, "drawing");
            assert_eq!(payload, "erase");
            send_frame(
                &conn,
                &ServerFrame::Published {
                    request_id,
                    replay_id: 41,
                },
            )
            .await;
            conn
        });

        let channel = WebSocketChannel::connect(&format!("ws://{addr}"))
            .await
            .unwrap();
        let replay_id = channel.publish("drawing", "erase".into()).await.unwrap();
        assert_eq!(replay_id, 41);
        relay.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_receives_events_sent_before_subscribed_reply() {
        let (listener, addr) = listen().await;
        let relay = tokio::spawn(async move {
            let conn = listener.accept().await.unwrap();
            let ClientFrame::Subscribe { request_id, .. } = recv_frame(&conn).await
            else {
                panic!("expected subscribe");
            };
            let subscription_id = SubscriptionId(7);
            // Retained events first, then the reply.
            for (replay_id, payload) in [(1, "one"), (2, "two")] {
                send_frame(
                    &conn,
                    &ServerFrame::Event {
                        subscription_id,
                        topic: "drawing".into(),
                        replay_id,
                        payload: payload.into(),
                    },
                )
                .await;
            }
            send_frame(
                &conn,
                &ServerFrame::Subscribed {
                    request_id,
                    subscription_id,
                },
            )
            .await;
            send_frame(
                &conn,
                &ServerFrame::Event {
                    subscription_id,
                    topic: "drawing".into(),
                    replay_id: 3,
                    payload: "three".into(),
                },
            )
            .await;
            conn
        });

        let channel = WebSocketChannel::connect(&format!("ws://{addr}"))
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
        let callback: MessageCallback = Arc::new(move |d| {
            let _ = tx.send(d);
        });
        let sub = channel
            .subscribe("drawing", ReplayFrom::AllRetained, callback)
            .await
            .unwrap();
        assert_eq!(sub.id, SubscriptionId(7));

        let mut payloads = Vec::new();
        for _ in 0..3 {
            payloads.push(rx.recv().await.unwrap().payload);
        }
        assert_eq!(payloads, vec!["one", "two", "three"]);
        relay.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_error_reply_is_rejected() {
        let (listener, addr) = listen().await;
        let relay = tokio::spawn(async move {
            let conn = listener.accept().await.unwrap();
            let request_id = recv_frame(&conn).await.request_id();
            send_frame(
                &conn,
                &ServerFrame::Error {
                    request_id: Some(request_id),
                    code: 503,
                    message: "bus unavailable".into(),
                },
            )
            .await;
            conn
        });

        let channel = WebSocketChannel::connect(&format!("ws://{addr}"))
            .await
            .unwrap();
        let err = channel.publish("drawing", "erase".into()).await.unwrap_err();
        assert!(matches!(err, ChannelError::Rejected { code: 503, .. }));
        relay.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_pending_request_fails_when_relay_hangs_up() {
        let (listener, addr) = listen().await;
        let relay = tokio::spawn(async move {
            let conn = listener.accept().await.unwrap();
            let _ = recv_frame(&conn).await;
            conn.close().await.unwrap();
        });

        let channel = WebSocketChannel::connect(&format!("ws://{addr}"))
            .await
            .unwrap();
        let err = channel.publish("drawing", "erase".into()).await.unwrap_err();
        assert!(matches!(err, ChannelError::ConnectionClosed(_)));
        relay.await.unwrap();
        assert!(channel.is_closed());
    }
}
