//! Models and search indexes, which only the standard dialect has.

use tests::{db::memory::SetupMemory, *};

use dbexport::manifest::ObjectStatus;
use dbexport_core::schema::{Field, Object};

fn embeddings_model() -> Object {
    Object::model(
        "EmbeddingsModel",
        vec![Field::new("content", "STRING(MAX)").not_null()],
        vec![Field::new(
            "embeddings",
            "STRUCT<statistics STRUCT<truncated BOOL, token_count FLOAT64>, values ARRAY<FLOAT64>>",
        )],
    )
}

async fn setup() -> SetupMemory {
    let setup = SetupMemory::google_standard_sql();
    create_singers(&setup, "T_Singers").await;
    setup.insert("T_Singers", singers(10)).await;
    setup.db.create(embeddings_model()).unwrap();
    setup
        .db
        .create(Object::search_index(
            "SingersByName",
            "T_Singers",
            vec!["name".to_string()],
        ))
        .unwrap();
    setup
}

#[tokio::test]
async fn schema_only_objects_get_one_empty_file() {
    let setup = setup().await;
    let export = export(&setup, |config| config).await;

    assert!(export.report.is_success(), "{:?}", export.report);

    let manifest = export.manifest();
    assert_eq!(
        manifest.objects.keys().collect::<Vec<_>>(),
        ["EmbeddingsModel", "SingersByName", "T_Singers"]
    );
    assert_eq!(manifest.objects["EmbeddingsModel"].kind, "MODEL");
    assert_eq!(manifest.objects["SingersByName"].kind, "SEARCH_INDEX");

    for object in ["EmbeddingsModel", "SingersByName"] {
        assert_eq!(export.status(object), &ObjectStatus::Complete);
        assert_eq!(
            manifest.files(object),
            [format!("{object}.avro-00000-of-00001")]
        );

        let files = export.files(object);
        assert!(files[0].records.is_empty());
        assert_eq!(files[0].schema["name"], object);
    }
}

#[tokio::test]
async fn model_schema_keeps_nesting() {
    let setup = setup().await;
    let export = export(&setup, |config| config).await;

    let schema = &export.files("EmbeddingsModel")[0].schema;
    assert_eq!(schema["objectKind"], "MODEL");

    let input = &schema["fields"][0];
    assert_eq!(input["name"], "Input");
    assert_eq!(input["type"]["name"], "EmbeddingsModel_Input");
    assert_eq!(input["type"]["fields"][0]["name"], "content");

    let output = &schema["fields"][1];
    assert_eq!(output["type"]["name"], "EmbeddingsModel_Output");

    let embeddings = &output["type"]["fields"][0];
    assert_eq!(embeddings["name"], "embeddings");
    // nullable struct: ["null", record]
    let embeddings = &embeddings["type"][1];
    assert_eq!(embeddings["type"], "record");

    let statistics = &embeddings["fields"][0];
    assert_eq!(statistics["name"], "statistics");
    assert_eq!(statistics["type"][1]["fields"][1]["name"], "token_count");
    assert_eq!(statistics["type"][1]["fields"][1]["type"], serde_json::json!(["null", "double"]));

    let values = &embeddings["fields"][1];
    assert_eq!(values["name"], "values");
    assert_eq!(
        values["type"],
        serde_json::json!(["null", {"type": "array", "items": ["null", "double"]}])
    );
}

#[tokio::test]
async fn search_index_schema_names_its_table() {
    let setup = setup().await;
    let export = export(&setup, |config| config).await;

    let schema = &export.files("SingersByName")[0].schema;
    assert_eq!(schema["objectKind"], "SEARCH_INDEX");
    assert_eq!(schema["baseTable"], "T_Singers");
    assert_eq!(schema["indexColumn_0"], "name");
    assert_eq!(schema["fields"], serde_json::json!([]));
}
