mod telemetry_tests;
