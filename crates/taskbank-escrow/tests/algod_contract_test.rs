//! Contract tests for AlgodEscrowContract: the exact transactions handed to
//! the wallet, the group submitted to algod, and confirmation handling.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use taskbank_algo_client::txn::{
    assign_group_id, ApplicationCall, BoxReference, SuggestedParams, Transaction,
};
use taskbank_algo_client::{AlgoClient, AlgoNetworkConfig, KmdConfig, Network};
use taskbank_core::{Address, MicroAlgos, PoolId, Round};
use taskbank_escrow::{
    abi, AlgodEscrowContract, ContractArtifact, EscrowClient, EscrowContract, EscrowError,
};
use wiremock::matchers::{body_bytes, body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn caller() -> Address {
    Address::from_public_key([0x11; 32])
}

fn receiver() -> Address {
    Address::from_public_key([0x22; 32])
}

fn pool() -> PoolId {
    PoolId::new(748154508).unwrap()
}

fn params() -> SuggestedParams {
    SuggestedParams {
        min_fee: MicroAlgos(1000),
        first_valid: Round(5000),
        last_valid: Round(6000),
        genesis_id: "testnet-v1.0".into(),
        genesis_hash: [7u8; 32],
    }
}

fn client(algod: &MockServer, kmd: &MockServer) -> AlgoClient {
    AlgoClient::new(AlgoNetworkConfig {
        network: Network::TestNet,
        algod_url: algod.uri().parse().unwrap(),
        algod_token: zeroize::Zeroizing::new("t".into()),
        indexer_url: "http://127.0.0.1:19001".parse().unwrap(),
        indexer_token: zeroize::Zeroizing::new(String::new()),
        kmd: Some(KmdConfig {
            url: kmd.uri().parse().unwrap(),
            token: zeroize::Zeroizing::new("t".into()),
            wallet_name: "escrow".into(),
            wallet_password: zeroize::Zeroizing::new(String::new()),
        }),
        timeout_secs: 5,
    })
    .unwrap()
}

fn contract(algod: &MockServer, kmd: &MockServer) -> AlgodEscrowContract<taskbank_algo_client::kmd::KmdClient> {
    let client = client(algod, kmd);
    let signer = client.kmd().unwrap().clone();
    AlgodEscrowContract::new(client, signer)
}

async fn mount_algod(server: &MockServer, confirmed: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v2/transactions/params"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "genesis-hash": BASE64.encode([7u8; 32]),
            "genesis-id": "testnet-v1.0",
            "last-round": 5000,
            "min-fee": 1000
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "last-round": 5000 })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/transactions/pending/[A-Z2-7]{52}$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(confirmed))
        .mount(server)
        .await;
}

async fn mount_kmd_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/wallets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "wallets": [{ "id": "w1", "name": "escrow" }]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/wallet/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "wallet_handle_token": "h1"
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/wallet/release"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(server)
        .await;
}

async fn mount_sign(server: &MockServer, unsigned: &Transaction, signed: &[u8]) {
    Mock::given(method("POST"))
        .and(path("/v1/transaction/sign"))
        .and(body_partial_json(serde_json::json!({
            "transaction": BASE64.encode(unsigned.encode().unwrap())
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signed_transaction": BASE64.encode(signed)
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn deposit_submits_grouped_payment_and_call() {
    let algod = MockServer::start().await;
    let kmd = MockServer::start().await;
    mount_algod(
        &algod,
        serde_json::json!({
            "confirmed-round": 5001,
            "pool-error": "",
            "logs": [BASE64.encode("deposit_ok")]
        }),
    )
    .await;
    mount_kmd_session(&kmd).await;

    let amount = MicroAlgos(150_000_000);
    let mut expected = vec![
        Transaction::payment(&params(), caller(), pool().address(), amount),
        Transaction::application_call(
            &params(),
            caller(),
            ApplicationCall {
                app_id: pool().get(),
                args: abi::deposit_args("T001").unwrap(),
                boxes: vec![BoxReference {
                    app_index: 0,
                    name: caller().as_bytes().to_vec(),
                }],
                ..ApplicationCall::default()
            },
        ),
    ];
    assign_group_id(&mut expected).unwrap();
    mount_sign(&kmd, &expected[0], b"signed-pay|").await;
    mount_sign(&kmd, &expected[1], b"signed-call").await;

    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .and(body_bytes(b"signed-pay|signed-call".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "txId": expected[0].id().unwrap().encode()
        })))
        .expect(1)
        .mount(&algod)
        .await;

    let receipt = contract(&algod, &kmd)
        .deposit(pool(), caller(), amount, "T001")
        .await
        .unwrap();
    assert_eq!(receipt.tx_id, expected[1].id().unwrap().encode());
    assert_eq!(receipt.confirmed_round, Round(5001));
    assert_eq!(receipt.logs, vec![b"deposit_ok".to_vec()]);
}

#[tokio::test]
async fn withdraw_carries_extra_fee_box_and_receiver() {
    let algod = MockServer::start().await;
    let kmd = MockServer::start().await;
    mount_algod(
        &algod,
        serde_json::json!({ "confirmed-round": 5002, "pool-error": "" }),
    )
    .await;
    mount_kmd_session(&kmd).await;

    let amount = MicroAlgos(50_000_000);
    let expected = Transaction::application_call(
        &params(),
        caller(),
        ApplicationCall {
            app_id: pool().get(),
            args: abi::withdraw_args(amount, &receiver()),
            accounts: vec![receiver()],
            boxes: vec![BoxReference {
                app_index: 0,
                name: caller().as_bytes().to_vec(),
            }],
            ..ApplicationCall::default()
        },
    )
    .with_extra_fee(MicroAlgos(2_000));
    assert_eq!(expected.fee, MicroAlgos(3_000));
    mount_sign(&kmd, &expected, b"signed-withdraw").await;

    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .and(body_bytes(b"signed-withdraw".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "txId": expected.id().unwrap().encode()
        })))
        .expect(1)
        .mount(&algod)
        .await;

    let receipt = contract(&algod, &kmd)
        .withdraw(pool(), caller(), amount, receiver())
        .await
        .unwrap();
    assert_eq!(receipt.confirmed_round, Round(5002));
}

#[tokio::test]
async fn submission_rejection_is_surfaced_verbatim() {
    let algod = MockServer::start().await;
    let kmd = MockServer::start().await;
    mount_algod(&algod, serde_json::json!({ "pool-error": "" })).await;
    mount_kmd_session(&kmd).await;
    Mock::given(method("POST"))
        .and(path("/v1/transaction/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signed_transaction": BASE64.encode(b"x")
        })))
        .mount(&kmd)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "logic eval error: assert failed pc=212"
        })))
        .expect(1)
        .mount(&algod)
        .await;

    let escrow = EscrowClient::new(contract(&algod, &kmd));
    let err = escrow
        .withdraw(pool().get(), caller(), MicroAlgos(1), &receiver().encode())
        .await
        .unwrap_err();
    match err {
        EscrowError::RemoteRejection { message } => {
            assert_eq!(message, "logic eval error: assert failed pc=212")
        }
        other => panic!("expected remote rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn create_reports_new_application_id() {
    let algod = MockServer::start().await;
    let kmd = MockServer::start().await;
    mount_algod(
        &algod,
        serde_json::json!({
            "confirmed-round": 5003,
            "pool-error": "",
            "application-index": 750000001
        }),
    )
    .await;
    mount_kmd_session(&kmd).await;
    Mock::given(method("POST"))
        .and(path("/v1/transaction/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signed_transaction": BASE64.encode(b"signed-create")
        })))
        .expect(1)
        .mount(&kmd)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .and(body_bytes(b"signed-create".to_vec()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "txId": "CREATE" })),
        )
        .mount(&algod)
        .await;

    let contract = contract(&algod, &kmd)
        .with_artifact(ContractArtifact::new(vec![0x0a, 0x20], vec![0x0a, 0x81]));
    let pool = EscrowClient::new(contract)
        .create_pool(caller())
        .await
        .unwrap();
    assert_eq!(pool.get(), 750000001);
}

#[tokio::test]
async fn create_without_programs_is_a_deployment_error() {
    let algod = MockServer::start().await;
    let kmd = MockServer::start().await;

    let err = EscrowClient::new(contract(&algod, &kmd))
        .create_pool(caller())
        .await
        .unwrap_err();
    assert!(matches!(err, EscrowError::Deployment(_)));
}
